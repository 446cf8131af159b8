use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("No script runtime available for language '{0}'")]
    RuntimeNotFound(String),

    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),
}
