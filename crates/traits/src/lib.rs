pub mod loader;
pub mod validator;

pub use loader::{InMemoryViewLoader, LoaderError, SharedSource, ViewLoader};
pub use validator::DocumentValidator;
