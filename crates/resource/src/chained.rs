//! Probing several view sources in order.

use log::{debug, trace};
use std::path::Path;
use std::sync::Arc;
use xview_traits::{InMemoryViewLoader, LoaderError, SharedSource, ViewLoader};

use crate::FilesystemViewLoader;

/// Tries each loader in turn until one produces the view.
///
/// A failing source kind never stops the probe: the next loader may still
/// serve the view. When none does, the first error that was not `NotFound`
/// is returned, or `NotFound` if every source came up empty.
#[derive(Debug, Default)]
pub struct ChainedViewLoader {
    loaders: Vec<Arc<dyn ViewLoader>>,
}

impl ChainedViewLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a loader; earlier loaders win.
    pub fn with_loader(mut self, loader: Arc<dyn ViewLoader>) -> Self {
        self.loaders.push(loader);
        self
    }

    pub fn push(&mut self, loader: Arc<dyn ViewLoader>) {
        self.loaders.push(loader);
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl ViewLoader for ChainedViewLoader {
    fn load(&self, uri: &str) -> Result<SharedSource, LoaderError> {
        let mut failure = None;
        for loader in &self.loaders {
            match loader.load(uri) {
                Ok(data) => {
                    trace!("'{}' served by {}", uri, loader.name());
                    return Ok(data);
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    debug!("{} failed on '{}', trying next source: {}", loader.name(), uri, e);
                    failure.get_or_insert(e);
                }
            }
        }
        Err(failure.unwrap_or_else(|| LoaderError::NotFound(uri.to_string())))
    }

    fn exists(&self, uri: &str) -> bool {
        self.loaders.iter().any(|l| l.exists(uri))
    }

    fn name(&self) -> &'static str {
        "ChainedViewLoader"
    }
}

/// The default loader: bundled sources first, then the filesystem below
/// `base_dir`.
///
/// Returns the chain together with the bundled store so callers can register
/// in-memory views after construction.
pub fn default_loader<P: AsRef<Path>>(base_dir: P) -> (ChainedViewLoader, Arc<InMemoryViewLoader>) {
    let bundled = Arc::new(InMemoryViewLoader::new());
    let chain = ChainedViewLoader::new()
        .with_loader(bundled.clone())
        .with_loader(Arc::new(FilesystemViewLoader::new(base_dir)));
    (chain, bundled)
}
