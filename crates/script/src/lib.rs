//! Script runtime adapter for XView.
//!
//! The rest of the system only needs two things from a script runtime:
//! compile source into something reusable, and execute that against a
//! context. [`ScriptRuntime::prepare`] and [`Executable::execute`] are that
//! surface; [`ContextPool`] keeps execution contexts around between renders.

mod context;
mod error;
mod pool;
mod runtime;

pub use context::ScriptContext;
pub use error::ScriptError;
pub use pool::{ContextPool, PoolGuard, PooledContext};
pub use runtime::{Executable, RuntimeRegistry, ScriptRuntime};
