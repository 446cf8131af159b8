//! Document model for XView templates.
//!
//! Views are parsed once with roxmltree and converted into an owned tree so
//! that a compiled view can outlive its source text. The root element's
//! declarations feed the [`NamespaceTable`], which decides how each prefixed
//! element is compiled.

pub mod error;
pub mod namespace;
pub mod node;
pub mod parse;
pub mod uri;
pub mod vocabulary;

pub use error::{DocumentError, NamespaceError};
pub use namespace::{Namespace, NamespaceTable};
pub use node::{Attribute, Element, Node, QName};
pub use parse::Document;
