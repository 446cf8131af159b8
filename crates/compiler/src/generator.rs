use log::debug;
use xview_document::vocabulary::{
    BRIDGE_BINDING, CHILD_CONTENT_BINDING, TAG_PROCESS_CHILD_NODES, TAG_SCRIPT, TAG_VIEW,
};
use xview_document::{Element, Namespace, NamespaceTable, Node, uri};

use crate::builder::CodeBuilder;
use crate::error::CompileError;
use crate::text::{escape_literal, minify_text};

/// Compiles a view's element tree into Lua source.
///
/// `uri` is the URI of the view being compiled; relative namespace URLs are
/// anchored on it so that child-content closures resolve the same way no
/// matter which view ends up running them.
pub fn compile(root: &Element, namespaces: &NamespaceTable, uri: &str) -> Result<String, CompileError> {
    let compiler = Compiler { namespaces, uri };
    let mut out = CodeBuilder::new();
    compiler.element(root, &mut out)?;
    let code = out.finish();
    debug!("Compiled '{}' into {} bytes of Lua", uri, code.len());
    Ok(code)
}

struct Compiler<'a> {
    namespaces: &'a NamespaceTable,
    uri: &'a str,
}

impl Compiler<'_> {
    fn node(&self, node: &Node, out: &mut CodeBuilder) -> Result<(), CompileError> {
        match node {
            Node::Text(text) => {
                let text = minify_text(text);
                if !text.is_empty() {
                    out.output(&text);
                }
                Ok(())
            }
            Node::Element(element) => self.element(element, out),
        }
    }

    fn children(&self, element: &Element, out: &mut CodeBuilder) -> Result<(), CompileError> {
        for child in &element.children {
            self.node(child, out)?;
        }
        Ok(())
    }

    fn element(&self, element: &Element, out: &mut CodeBuilder) -> Result<(), CompileError> {
        let Some(prefix) = element.name.prefix() else {
            return self.markup(element, out);
        };

        let namespace = self.namespaces.get(prefix).ok_or_else(|| unknown(element))?;
        if namespace.is_template() {
            self.builtin(element, out)
        } else {
            self.invocation(element, prefix, namespace, out)
        }
    }

    fn markup(&self, element: &Element, out: &mut CodeBuilder) -> Result<(), CompileError> {
        let tag = element.name.to_string();
        out.output("<").output(&tag);
        for attr in &element.attributes {
            out.output(" ")
                .output(&attr.name.to_string())
                .output("=\"")
                .output(&attr.value)
                .output("\"");
        }

        if !element.has_children() {
            out.output("/>");
            return Ok(());
        }

        out.output(">");
        self.children(element, out)?;
        out.output("</").output(&tag).output(">");
        Ok(())
    }

    fn builtin(&self, element: &Element, out: &mut CodeBuilder) -> Result<(), CompileError> {
        let local = element.name.local.as_str();
        if local.eq_ignore_ascii_case(TAG_SCRIPT) {
            out.statement("\n")
                .statement(&element.text_content())
                .statement("\n");
            Ok(())
        } else if local.eq_ignore_ascii_case(TAG_VIEW) {
            self.children(element, out)
        } else if local.eq_ignore_ascii_case(TAG_PROCESS_CHILD_NODES) {
            out.statement(&format!(
                "if {0} then assert(load(\"return \" .. {0}, \"=children\", \"t\", _ENV))()() end\n",
                CHILD_CONTENT_BINDING
            ));
            Ok(())
        } else {
            Err(unknown(element))
        }
    }

    /// Emits a call into another view.
    ///
    /// The element's children become a closure fragment handed over as source
    /// text; the callee decides where (and whether) it runs.
    fn invocation(
        &self,
        element: &Element,
        prefix: &str,
        namespace: &Namespace,
        out: &mut CodeBuilder,
    ) -> Result<(), CompileError> {
        let url = namespace.url().ok_or_else(|| unknown(element))?;
        let base = uri::anchor(self.uri, url);

        let mut closure = CodeBuilder::new();
        closure.statement("function()\n");
        self.children(element, &mut closure)?;
        closure.statement("end");
        let closure = closure.finish();

        out.statement(&format!(
            "{}:execute(\"{}\", \"{}\", {}, \"{}\");\n",
            BRIDGE_BINDING,
            escape_literal(&base),
            escape_literal(&element.name.local),
            self.call_attributes(element, prefix),
            escape_literal(&closure)
        ));
        Ok(())
    }

    /// An immediately invoked function building the call-attribute table.
    ///
    /// Only attributes in the element's own namespace are passed (unprefixed
    /// ones count as such), never namespace declarations. Values are Lua expressions evaluated in the
    /// caller's scope; falsy results are left out.
    fn call_attributes(&self, element: &Element, prefix: &str) -> String {
        let mut code = String::from("(function() local map = {} ");
        for (i, attr) in element.attributes.iter().enumerate() {
            if attr.is_namespace_declaration() {
                continue;
            }
            let attr_prefix = attr.name.prefix().unwrap_or(prefix);
            if !attr_prefix.eq_ignore_ascii_case(prefix) {
                continue;
            }

            let value = if attr.value.trim().is_empty() {
                "\"\""
            } else {
                attr.value.as_str()
            };
            code.push_str(&format!(
                "local value_{i} = {value} if {bridge}:truthy(value_{i}) then map[\"{key}\"] = value_{i} end ",
                i = i,
                value = value,
                bridge = BRIDGE_BINDING,
                key = escape_literal(&attr.name.local)
            ));
        }
        code.push_str("return map end)()");
        code
    }
}

fn unknown(element: &Element) -> CompileError {
    CompileError::UnknownTag {
        tag: element.name.to_string(),
    }
}
