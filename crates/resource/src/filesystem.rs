//! Filesystem-based view loader for native platforms.
//!
//! View URIs are resolved below a base directory. A leading `/` means "rooted
//! at the base", which is how view URIs such as `/pages/index.xview` are
//! written. Resolved paths must stay inside the base directory.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use xview_traits::{LoaderError, SharedSource, ViewLoader};

/// A view loader that reads views from the local filesystem.
///
/// # Security
///
/// Paths are canonicalized and checked against the canonical base directory.
/// URIs escaping the base (e.g. `../../etc/passwd`) resolve to `NotFound`.
#[derive(Debug)]
pub struct FilesystemViewLoader {
    base_path: PathBuf,
    canonical_base: Option<PathBuf>,
}

impl FilesystemViewLoader {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        // May fail if the directory doesn't exist yet
        let canonical = base.canonicalize().ok();
        Self {
            base_path: base,
            canonical_base: canonical,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base_path
    }

    /// Maps a view URI onto a path below the base directory.
    ///
    /// Returns `None` if the URI would escape the base directory.
    fn resolve_path_safe(&self, uri: &str) -> Option<PathBuf> {
        let normalized = uri.replace('\\', "/");
        let relative = normalized.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }

        let relative_path = Path::new(relative);
        if relative_path.is_absolute() {
            return None;
        }

        let full_path = self.base_path.join(relative_path);

        if let Ok(canonical) = full_path.canonicalize()
            && let Some(ref base) = self.canonical_base
        {
            if canonical.starts_with(base) {
                return Some(canonical);
            }
            return None;
        }

        // Not on disk (yet); fall back to a component check
        if relative_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return None;
        }

        Some(full_path)
    }
}

impl ViewLoader for FilesystemViewLoader {
    fn load(&self, uri: &str) -> Result<SharedSource, LoaderError> {
        let full_path = self
            .resolve_path_safe(uri)
            .ok_or_else(|| LoaderError::NotFound(format!("{} (outside of view root)", uri)))?;

        if !full_path.is_file() {
            return Err(LoaderError::NotFound(uri.to_string()));
        }

        std::fs::read(&full_path).map(Arc::new).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoaderError::NotFound(uri.to_string())
            } else {
                LoaderError::LoadFailed {
                    path: uri.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn exists(&self, uri: &str) -> bool {
        self.resolve_path_safe(uri)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "FilesystemViewLoader"
    }
}
