//! ViewLoader trait for abstracting template loading.
//!
//! The engine resolves view URIs to bytes through this trait, so templates can
//! live on disk, in memory, or in any other store without the engine knowing.

use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Error type for view loading operations.
#[derive(Error, Debug, Clone)]
pub enum LoaderError {
    /// The URI does not resolve to anything in this loader. Chained loaders
    /// treat this as "try the next source".
    #[error("View not found: {0}")]
    NotFound(String),

    #[error("Failed to load view '{path}': {message}")]
    LoadFailed { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl LoaderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoaderError::NotFound(_))
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::Io(err.to_string())
    }
}

/// Shared template source (reference-counted bytes).
pub type SharedSource = Arc<Vec<u8>>;

/// A trait for turning a view URI into its raw bytes.
///
/// # Implementations
///
/// - `InMemoryViewLoader`: bundled sources registered up front (always available)
/// - `FilesystemViewLoader`: files below a base directory (`xview-resource`)
/// - `ChainedViewLoader`: probes several loaders in order (`xview-resource`)
///
/// # Example
///
/// ```ignore
/// let loader = InMemoryViewLoader::new();
/// loader.add("/pages/index.xview", source_bytes)?;
/// let bytes = loader.load("/pages/index.xview")?;
/// ```
pub trait ViewLoader: Send + Sync + Debug {
    /// Load a view by its URI.
    ///
    /// Returns `LoaderError::NotFound` when the URI is simply absent from this
    /// source; any other error means the source exists but could not be read.
    fn load(&self, uri: &str) -> Result<SharedSource, LoaderError>;

    /// Check if a view exists.
    fn exists(&self, uri: &str) -> bool;

    /// Returns a human-readable name for this loader (for logging/debugging).
    fn name(&self) -> &'static str;
}

impl<L: ViewLoader + ?Sized> ViewLoader for Arc<L> {
    fn load(&self, uri: &str) -> Result<SharedSource, LoaderError> {
        (**self).load(uri)
    }

    fn exists(&self, uri: &str) -> bool {
        (**self).exists(uri)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// An in-memory view loader.
///
/// Sources are stored in memory and must be registered before use. This is the
/// "bundled resource" source kind and the loader of choice in tests.
#[derive(Debug, Default)]
pub struct InMemoryViewLoader {
    sources: std::sync::RwLock<std::collections::HashMap<String, SharedSource>>,
}

impl InMemoryViewLoader {
    pub fn new() -> Self {
        Self {
            sources: std::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }

    /// Register a view source under `uri`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `LoaderError::LoadFailed` if the internal lock is poisoned.
    pub fn add(&self, uri: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<(), LoaderError> {
        let uri = uri.into();
        let mut sources = self.sources.write().map_err(|_| LoaderError::LoadFailed {
            path: uri.clone(),
            message: "view store lock poisoned".to_string(),
        })?;
        sources.insert(uri, Arc::new(data.into()));
        Ok(())
    }

    /// Builder-style variant of [`add`](Self::add) for setting up fixtures.
    pub fn with(self, uri: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<Self, LoaderError> {
        self.add(uri, data)?;
        Ok(self)
    }

    /// Remove a view from the store.
    ///
    /// Returns `None` if the lock is poisoned or the view doesn't exist.
    pub fn remove(&self, uri: &str) -> Option<SharedSource> {
        self.sources.write().ok()?.remove(uri)
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.sources.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Returns `true` if the lock is poisoned.
    pub fn is_empty(&self) -> bool {
        self.sources.read().map(|s| s.is_empty()).unwrap_or(true)
    }
}

impl ViewLoader for InMemoryViewLoader {
    fn load(&self, uri: &str) -> Result<SharedSource, LoaderError> {
        let sources = self.sources.read().map_err(|_| LoaderError::LoadFailed {
            path: uri.to_string(),
            message: "view store lock poisoned".to_string(),
        })?;
        sources
            .get(uri)
            .cloned()
            .ok_or_else(|| LoaderError::NotFound(uri.to_string()))
    }

    fn exists(&self, uri: &str) -> bool {
        self.sources
            .read()
            .map(|s| s.contains_key(uri))
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "InMemoryViewLoader"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_loader_add_and_load() {
        let loader = InMemoryViewLoader::new();
        loader.add("/a.xview", "<view/>").unwrap();

        let data = loader.load("/a.xview").unwrap();
        assert_eq!(&*data, b"<view/>");
    }

    #[test]
    fn test_in_memory_loader_not_found() {
        let loader = InMemoryViewLoader::new();
        let result = loader.load("/missing.xview");
        assert!(matches!(result, Err(LoaderError::NotFound(_))));
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_in_memory_loader_exists_and_remove() {
        let loader = InMemoryViewLoader::new()
            .with("/a.xview", "x")
            .unwrap();

        assert!(loader.exists("/a.xview"));
        assert!(loader.remove("/a.xview").is_some());
        assert!(!loader.exists("/a.xview"));
        assert!(loader.remove("/a.xview").is_none());
    }

    #[test]
    fn test_in_memory_loader_overwrite() {
        let loader = InMemoryViewLoader::new();
        loader.add("a", "original").unwrap();
        loader.add("a", "updated").unwrap();

        assert_eq!(&*loader.load("a").unwrap(), b"updated");
        assert_eq!(loader.len(), 1);
        assert!(!loader.is_empty());
    }

    #[test]
    fn test_loader_through_arc() {
        let loader = Arc::new(InMemoryViewLoader::new().with("a", "1").unwrap());
        let shared: &dyn ViewLoader = &loader;
        assert!(shared.exists("a"));
        assert_eq!(shared.name(), "InMemoryViewLoader");
    }

    #[test]
    fn test_loader_error_display() {
        let err = LoaderError::NotFound("a.xview".to_string());
        assert!(err.to_string().contains("a.xview"));

        let err = LoaderError::LoadFailed {
            path: "b.xview".to_string(),
            message: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("b.xview"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_loader_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: LoaderError = io_err.into();
        assert!(matches!(err, LoaderError::Io(_)));
        assert!(!err.is_not_found());
    }
}
