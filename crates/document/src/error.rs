use thiserror::Error;

#[derive(Error, Debug)]
pub enum NamespaceError {
    #[error("xsi:schemaLocation must hold namespace/url pairs, found {count} token(s)")]
    OddSchemaLocation { count: usize },
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("XML parsing error: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("Namespace resolution error: {0}")]
    Namespace(#[from] NamespaceError),
}
