//! Reserved names of the XView dialect.
//!
//! Names matched against tags and namespaces are compared case-insensitively.

/// Target namespace of builtin directives and default-attribute declarations.
pub const TEMPLATE_NAMESPACE: &str = "xview";

/// Groups children without emitting a container tag.
pub const TAG_VIEW: &str = "view";

/// Raw script statements.
pub const TAG_SCRIPT: &str = "script";

/// Placement of the caller's child content.
pub const TAG_PROCESS_CHILD_NODES: &str = "process_child_nodes";

/// Binding that carries the caller's child-content closure source.
pub const CHILD_CONTENT_BINDING: &str = "__process_child_nodes";

/// Binding under which the host bridge is installed.
pub const BRIDGE_BINDING: &str = "xview";

/// Extension appended to a tag name to find the invoked view.
pub const VIEW_EXTENSION: &str = ".xview";

/// Default script language.
pub const DEFAULT_LANGUAGE: &str = "lua";

pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

pub const SCHEMA_LOCATION: &str = "schemaLocation";

pub const XMLNS_PREFIX: &str = "xmlns";

/// Returns `true` if `namespace` names the template namespace.
pub fn is_template_namespace(namespace: &str) -> bool {
    namespace.eq_ignore_ascii_case(TEMPLATE_NAMESPACE)
}
