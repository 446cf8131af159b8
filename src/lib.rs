//! XView: XML views compiled to Lua.
//!
//! A view is an XML document. Plain elements and text are output as-is,
//! `${expr}` evaluates a Lua expression, elements in the `xview` namespace
//! are directives (`view`, `script`, `process_child_nodes`), and elements in
//! any other declared namespace render another view from that namespace's
//! directory, passing attributes and child content along.
//!
//! ```ignore
//! use xview::{InMemoryViewLoader, ViewEngine};
//!
//! let loader = InMemoryViewLoader::new()
//!     .with("/page.xview", r#"<xview:view xmlns:xview="xview" xview:name="world"><p>Hello ${name}</p></xview:view>"#)?;
//! let engine = ViewEngine::new(loader)?;
//! let page = engine.load("/page.xview")?;
//! assert_eq!(engine.render_to_string(&page, &Default::default())?, "<p>Hello world</p>");
//! ```

mod bridge;
mod builder;
mod config;
mod engine;
mod error;
mod sink;
mod view;

pub use builder::EngineBuilder;
pub use config::EngineConfig;
pub use engine::ViewEngine;
pub use error::ViewError;
pub use sink::OutputSink;
pub use view::View;

pub use xview_document::vocabulary;
pub use xview_resource::{ChainedViewLoader, FilesystemViewLoader, default_loader};
pub use xview_script::RuntimeRegistry;
pub use xview_traits::{DocumentValidator, InMemoryViewLoader, LoaderError, SharedSource, ViewLoader};

/// Caller-supplied attributes.
pub type Attributes = serde_json::Map<String, serde_json::Value>;
