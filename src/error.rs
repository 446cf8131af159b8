use thiserror::Error;
use xview_document::{DocumentError, NamespaceError};
use xview_script::ScriptError;
use xview_traits::LoaderError;

/// Everything that can go wrong loading or rendering a view.
///
/// None of these are retried. Errors raised by nested views surface as the
/// `source` of the caller's [`ViewError::Execution`]; [`ViewError::innermost`]
/// digs them back out.
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("View not found: {0}")]
    NotFound(String),

    #[error("Failed to load view '{uri}': {source}")]
    Load {
        uri: String,
        #[source]
        source: LoaderError,
    },

    #[error("View '{uri}' is not valid UTF-8: {source}")]
    Encoding {
        uri: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("View '{uri}' failed validation: {message}")]
    Validation { uri: String, message: String },

    #[error("Failed to parse view '{uri}': {source}")]
    Parse {
        uri: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Namespace error in view '{uri}': {source}")]
    Namespace {
        uri: String,
        #[source]
        source: NamespaceError,
    },

    #[error("{uri} -> unknown tag [{tag}]")]
    UnknownTag { uri: String, tag: String },

    #[error("View '{uri}' was not loaded by this engine")]
    InstanceMismatch { uri: String },

    #[error("No script runtime available for language '{0}'")]
    RuntimeNotFound(String),

    #[error("Failed to render '{uri}': {source}")]
    Execution {
        uri: String,
        #[source]
        source: ScriptError,
    },

    #[error("View nesting deeper than {limit} levels at '{uri}'")]
    NestingTooDeep { uri: String, limit: usize },

    #[error("Script runtime error: {0}")]
    Script(ScriptError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ViewError {
    pub(crate) fn document(uri: &str, err: DocumentError) -> Self {
        match err {
            DocumentError::Parse(source) => ViewError::Parse {
                uri: uri.to_string(),
                source,
            },
            DocumentError::Namespace(source) => ViewError::Namespace {
                uri: uri.to_string(),
                source,
            },
        }
    }

    pub(crate) fn execution(uri: &str, source: impl Into<ScriptError>) -> Self {
        ViewError::Execution {
            uri: uri.to_string(),
            source: source.into(),
        }
    }

    /// The error raised by the most deeply nested view.
    ///
    /// Execution failures caused by a nested view's own error are unwrapped
    /// until an error that did not come from a nested view is found.
    pub fn innermost(&self) -> &ViewError {
        let mut current = self;
        while let ViewError::Execution {
            source: ScriptError::Lua(lua_err),
            ..
        } = current
        {
            match nested_view_error(lua_err) {
                Some(nested) => current = nested,
                None => break,
            }
        }
        current
    }
}

fn nested_view_error(err: &mlua::Error) -> Option<&ViewError> {
    match err {
        mlua::Error::ExternalError(inner) => inner.downcast_ref::<ViewError>(),
        mlua::Error::CallbackError { cause, .. } => nested_view_error(cause),
        mlua::Error::WithContext { cause, .. } => nested_view_error(cause),
        _ => None,
    }
}

impl From<ScriptError> for ViewError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::RuntimeNotFound(language) => ViewError::RuntimeNotFound(language),
            other => ViewError::Script(other),
        }
    }
}

impl From<serde_json::Error> for ViewError {
    fn from(err: serde_json::Error) -> Self {
        ViewError::Config(err.to_string())
    }
}
