//! View loaders for the XView template engine.
//!
//! This crate provides the platform-specific implementations of the
//! `ViewLoader` trait from xview-traits.
//!
//! ## Available Loaders
//!
//! - [`FilesystemViewLoader`]: Loads views from below a base directory
//! - [`ChainedViewLoader`]: Probes several loaders in order
//!
//! ## Re-exports
//!
//! For convenience, we also re-export the in-memory loader from xview-traits:
//! - [`InMemoryViewLoader`]: Bundled, pre-registered sources

mod chained;
mod filesystem;

pub use chained::{ChainedViewLoader, default_loader};
pub use filesystem::FilesystemViewLoader;

pub use xview_traits::InMemoryViewLoader;
