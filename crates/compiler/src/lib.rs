//! XView code generator.
//!
//! A single recursive pass turns a view's element tree into Lua source.
//! Literal output is batched into `xview:print("...")` statements and flushed
//! whenever script has to run in between, so output order always matches
//! source order.

mod builder;
mod error;
mod generator;
mod text;

pub use builder::CodeBuilder;
pub use error::CompileError;
pub use generator::compile;
pub use text::{escape_literal, minify_text};
