use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A prefix with no namespace, or a template-namespace tag that is not a
    /// builtin.
    #[error("unknown tag [{tag}]")]
    UnknownTag { tag: String },
}
