use std::sync::Arc;
use xview_script::RuntimeRegistry;
use xview_traits::{DocumentValidator, ViewLoader};

use crate::config::EngineConfig;
use crate::engine::ViewEngine;
use crate::error::ViewError;

/// A builder for creating a `ViewEngine`.
#[derive(Default)]
pub struct EngineBuilder {
    loader: Option<Arc<dyn ViewLoader>>,
    config: EngineConfig,
    validator: Option<Arc<dyn DocumentValidator>>,
    registry: Option<Arc<RuntimeRegistry>>,
}

impl EngineBuilder {
    /// Creates a new `EngineBuilder` with default settings.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets where views are loaded from. Required.
    pub fn with_loader<L: ViewLoader + 'static>(mut self, loader: L) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Selects the script language of the generated code.
    pub fn with_language(mut self, language: &str) -> Self {
        self.config.language = language.to_string();
        self
    }

    pub fn with_context_pool_capacity(mut self, capacity: usize) -> Self {
        self.config.context_pool_capacity = capacity;
        self
    }

    /// Compile views once (`true`) or re-load their source on every render.
    pub fn with_compilation(mut self, compile: bool) -> Self {
        self.config.compile = compile;
        self
    }

    /// Keep loaded views by URI.
    pub fn with_view_cache(mut self, cache: bool) -> Self {
        self.config.cache_views = cache;
        self
    }

    /// Installs a validator and turns validation on.
    pub fn with_validator<V: DocumentValidator + 'static>(mut self, validator: V) -> Self {
        self.validator = Some(Arc::new(validator));
        self.config.validate_schema = true;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.config.max_nesting_depth = depth;
        self
    }

    /// Shares script runtimes with other engines using the same registry.
    /// By default each engine gets a registry of its own.
    pub fn with_registry(mut self, registry: Arc<RuntimeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Consumes the builder and creates the `ViewEngine`.
    ///
    /// Fails if no loader was configured or the language has no runtime.
    pub fn build(self) -> Result<ViewEngine, ViewError> {
        let loader = self.loader.ok_or_else(|| {
            ViewError::Config("No view loader has been configured. Use `with_loader`.".to_string())
        })?;
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(RuntimeRegistry::new()));

        ViewEngine::from_parts(self.config, loader, self.validator, registry)
    }
}
