use indexmap::IndexMap;
use log::debug;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use xview_compiler::CompileError;
use xview_document::{Document, Element, NamespaceTable};
use xview_script::{Executable, ScriptError, ScriptRuntime};

use crate::error::ViewError;

/// One compiled template, identified by its URI.
///
/// Parsing and code generation happen when the view is built. The only
/// thing that changes afterwards is the prepared executable, filled in on
/// first render.
pub struct View {
    uri: String,
    default_attributes: IndexMap<String, String>,
    root: Element,
    namespaces: NamespaceTable,
    source: String,
    executable: OnceCell<Executable>,
    engine_id: u64,
}

impl View {
    pub(crate) fn compile(engine_id: u64, uri: &str, text: &str) -> Result<Self, ViewError> {
        let document = Document::parse(text).map_err(|e| ViewError::document(uri, e))?;
        let namespaces = document.namespaces().map_err(|e| ViewError::document(uri, e))?;
        let default_attributes = namespaces.template_attributes();
        let root = document.into_root();

        let source = xview_compiler::compile(&root, &namespaces, uri).map_err(|e| match e {
            CompileError::UnknownTag { tag } => ViewError::UnknownTag {
                uri: uri.to_string(),
                tag,
            },
        })?;

        Ok(Self {
            uri: uri.to_string(),
            default_attributes,
            root,
            namespaces,
            source,
            executable: OnceCell::new(),
            engine_id,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Declared attributes and their defaults; also the whitelist of what a
    /// caller may override.
    pub fn default_attributes(&self) -> &IndexMap<String, String> {
        &self.default_attributes
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// The generated Lua source.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_prepared(&self) -> bool {
        self.executable.get().is_some()
    }

    pub(crate) fn engine_id(&self) -> u64 {
        self.engine_id
    }

    /// Returns the prepared executable, preparing it on first use.
    ///
    /// Preparation runs outside the cell so that a render blocked on the
    /// runtime never holds the cell; concurrent first renders may both
    /// prepare, and the first one published is kept.
    pub(crate) fn executable(
        &self,
        runtime: &Arc<ScriptRuntime>,
        try_compile: bool,
    ) -> Result<&Executable, ScriptError> {
        if let Some(executable) = self.executable.get() {
            return Ok(executable);
        }

        let prepared = runtime.prepare(try_compile, &self.uri, &self.source)?;
        debug!("Prepared '{}' (compiled: {})", self.uri, prepared.is_compiled());
        Ok(self.executable.get_or_init(move || prepared))
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("uri", &self.uri)
            .field("default_attributes", &self.default_attributes)
            .field("prepared", &self.is_prepared())
            .finish()
    }
}
