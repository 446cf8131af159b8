use serde::{Deserialize, Serialize};
use xview_document::vocabulary::DEFAULT_LANGUAGE;

use crate::error::ViewError;

/// Engine settings.
///
/// Deserializes from camelCase JSON; missing keys take their defaults.
///
/// ```
/// use xview::EngineConfig;
/// let config = EngineConfig::from_json(r#"{ "contextPoolCapacity": 8, "compile": false }"#).unwrap();
/// assert_eq!(config.context_pool_capacity, 8);
/// assert_eq!(config.language, "lua");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Script language of the generated code.
    pub language: String,
    /// Idle execution contexts kept for reuse.
    pub context_pool_capacity: usize,
    /// Compile views once instead of re-loading their source per render.
    pub compile: bool,
    /// Keep loaded views by URI instead of loading them on every request.
    pub cache_views: bool,
    /// Run the configured validator before parsing.
    pub validate_schema: bool,
    /// Deepest chain of views invoking views.
    pub max_nesting_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            context_pool_capacity: 50,
            compile: true,
            cache_views: true,
            validate_schema: false,
            max_nesting_depth: 32,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ViewError> {
        Ok(serde_json::from_str(json)?)
    }
}
