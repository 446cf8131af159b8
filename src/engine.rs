//! Loading views and rendering them.

use log::{debug, info, warn};
use mlua::Value;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use xview_document::vocabulary::{BRIDGE_BINDING, CHILD_CONTENT_BINDING};
use xview_script::{ContextPool, RuntimeRegistry, ScriptContext, ScriptRuntime};
use xview_traits::{DocumentValidator, ViewLoader};

use crate::bridge::Bridge;
use crate::builder::EngineBuilder;
use crate::config::EngineConfig;
use crate::error::ViewError;
use crate::sink::OutputSink;
use crate::view::View;

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Loads, compiles and renders views.
///
/// Cloning is cheap and clones share everything: the view cache, the context
/// pool and the script runtime. `render` may be called from many threads at
/// once, on the same view.
///
/// # Example
///
/// ```ignore
/// let loader = InMemoryViewLoader::new().with("/hello.xview", "<p>${1 + 1}</p>")?;
/// let engine = ViewEngine::new(loader)?;
/// let view = engine.load("/hello.xview")?;
/// assert_eq!(engine.render_to_string(&view, &Map::new())?, "<p>2</p>");
/// ```
#[derive(Clone)]
pub struct ViewEngine {
    shared: Arc<EngineShared>,
}

pub(crate) struct EngineShared {
    id: u64,
    config: EngineConfig,
    loader: Arc<dyn ViewLoader>,
    validator: Option<Arc<dyn DocumentValidator>>,
    views: RwLock<HashMap<String, Arc<View>>>,
    pool: ContextPool<ScriptContext>,
    runtime: Arc<ScriptRuntime>,
}

impl ViewEngine {
    /// An engine with the default configuration.
    pub fn new<L: ViewLoader + 'static>(loader: L) -> Result<Self, ViewError> {
        EngineBuilder::new().with_loader(loader).build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn from_parts(
        config: EngineConfig,
        loader: Arc<dyn ViewLoader>,
        validator: Option<Arc<dyn DocumentValidator>>,
        registry: Arc<RuntimeRegistry>,
    ) -> Result<Self, ViewError> {
        let runtime = registry.runtime(&config.language)?;
        let factory_runtime = runtime.clone();
        let pool = ContextPool::new(config.context_pool_capacity, move || {
            factory_runtime.new_context()
        })?;

        let id = NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed);
        info!(
            "View engine #{} ready (language: {}, pool: {}, loader: {})",
            id,
            runtime.language(),
            config.context_pool_capacity,
            loader.name()
        );

        Ok(Self {
            shared: Arc::new(EngineShared {
                id,
                config,
                loader,
                validator,
                views: RwLock::new(HashMap::new()),
                pool,
                runtime,
            }),
        })
    }

    /// Loads the view at `uri`, from the cache when enabled.
    pub fn load(&self, uri: &str) -> Result<Arc<View>, ViewError> {
        self.shared.load(uri)
    }

    /// Builds a view from source text without going through the loader or
    /// the cache.
    pub fn view_from_source(&self, uri: &str, source: &str) -> Result<Arc<View>, ViewError> {
        Ok(Arc::new(View::compile(self.shared.id, uri, source)?))
    }

    /// Renders `view` into `sink`.
    ///
    /// Only attributes the view declares are taken from `attributes`; nulls
    /// and blank strings leave the declared default in place.
    pub fn render(
        &self,
        view: &Arc<View>,
        attributes: &Map<String, JsonValue>,
        sink: &OutputSink,
    ) -> Result<(), ViewError> {
        self.render_with_children(view, attributes, sink, None)
    }

    /// Renders `view` with child content: Lua source of a zero-argument
    /// function, run wherever the view places `process_child_nodes`.
    pub fn render_with_children(
        &self,
        view: &Arc<View>,
        attributes: &Map<String, JsonValue>,
        sink: &OutputSink,
        children: Option<&str>,
    ) -> Result<(), ViewError> {
        let mut converted = Vec::with_capacity(attributes.len());
        for (name, value) in attributes {
            let value = self
                .shared
                .runtime
                .to_value(value)
                .map_err(|e| ViewError::execution(view.uri(), e))?;
            converted.push((name.clone(), value));
        }
        self.shared
            .render_scoped(view, converted, sink, children.map(str::to_string), 0)
    }

    /// Renders into a string. Output that is not UTF-8 is replaced lossily.
    pub fn render_to_string(
        &self,
        view: &Arc<View>,
        attributes: &Map<String, JsonValue>,
    ) -> Result<String, ViewError> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        self.render(view, attributes, &OutputSink::from_shared(buffer.clone()))?;
        let bytes = buffer.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Idle contexts currently pooled.
    pub fn pool_len(&self) -> usize {
        self.shared.pool.len()
    }

    pub fn pool_capacity(&self) -> usize {
        self.shared.pool.capacity()
    }

    pub fn language(&self) -> &str {
        self.shared.runtime.language()
    }

    pub fn runtime(&self) -> &Arc<ScriptRuntime> {
        &self.shared.runtime
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Number of views in the cache.
    pub fn cached_views(&self) -> usize {
        self.shared
            .views
            .read()
            .map(|views| views.len())
            .unwrap_or(0)
    }

    /// Forgets every cached view; the next `load` goes back to the loader.
    pub fn clear_cache(&self) {
        let drained: Vec<Arc<View>> = match self.shared.views.write() {
            Ok(mut views) => views.drain().map(|(_, view)| view).collect(),
            Err(_) => Vec::new(),
        };
        debug!("Cleared {} cached view(s)", drained.len());
    }
}

impl fmt::Debug for ViewEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewEngine")
            .field("id", &self.shared.id)
            .field("config", &self.shared.config)
            .field("loader", &self.shared.loader.name())
            .field("pool", &self.shared.pool)
            .finish()
    }
}

impl EngineShared {
    pub(crate) fn load(&self, uri: &str) -> Result<Arc<View>, ViewError> {
        if self.config.cache_views
            && let Some(view) = self
                .views
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(uri)
        {
            return Ok(view.clone());
        }

        let view = Arc::new(self.read_view(uri)?);
        if !self.config.cache_views {
            return Ok(view);
        }

        let mut views = self.views.write().unwrap_or_else(PoisonError::into_inner);
        let cached = views
            .entry(uri.to_string())
            .or_insert_with(|| view.clone())
            .clone();
        drop(views);
        debug!("Cached view '{}'", uri);
        Ok(cached)
    }

    fn read_view(&self, uri: &str) -> Result<View, ViewError> {
        let bytes = self.loader.load(uri).map_err(|e| {
            if e.is_not_found() {
                ViewError::NotFound(uri.to_string())
            } else {
                ViewError::Load {
                    uri: uri.to_string(),
                    source: e,
                }
            }
        })?;

        let text = std::str::from_utf8(&bytes).map_err(|source| ViewError::Encoding {
            uri: uri.to_string(),
            source,
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        if self.config.validate_schema {
            match &self.validator {
                Some(validator) => validator
                    .validate(uri, text)
                    .map_err(|message| ViewError::Validation {
                        uri: uri.to_string(),
                        message,
                    })?,
                None => warn!("Validation requested for '{}' but no validator is configured", uri),
            }
        }

        debug!("Loaded '{}' via {}", uri, self.loader.name());
        View::compile(self.id, uri, text)
    }

    /// One render: fresh context, effective attributes, bridge, execute.
    ///
    /// The context goes back to the pool when the guard drops, on every
    /// path out of here.
    pub(crate) fn render_scoped(
        self: &Arc<Self>,
        view: &Arc<View>,
        attributes: Vec<(String, Value)>,
        sink: &OutputSink,
        children: Option<String>,
        depth: usize,
    ) -> Result<(), ViewError> {
        if view.engine_id() != self.id {
            return Err(ViewError::InstanceMismatch {
                uri: view.uri().to_string(),
            });
        }
        if depth > self.config.max_nesting_depth {
            return Err(ViewError::NestingTooDeep {
                uri: view.uri().to_string(),
                limit: self.config.max_nesting_depth,
            });
        }

        let uri = view.uri();
        let context = self
            .pool
            .acquire()
            .map_err(|e| ViewError::execution(uri, e))?;

        for (name, value) in view.default_attributes() {
            context
                .set(name, value.as_str())
                .map_err(|e| ViewError::execution(uri, e))?;
        }
        for (name, value) in attributes {
            if view.default_attributes().contains_key(&name) && overrides_default(&value) {
                context
                    .set(&name, value)
                    .map_err(|e| ViewError::execution(uri, e))?;
            }
        }
        context
            .set(CHILD_CONTENT_BINDING, children)
            .map_err(|e| ViewError::execution(uri, e))?;

        let bridge = Bridge {
            engine: Arc::downgrade(self),
            view: view.clone(),
            context: (*context).clone(),
            sink: sink.clone(),
            depth,
        };
        let bridge = self
            .runtime
            .lua()
            .create_userdata(bridge)
            .map_err(|e| ViewError::execution(uri, e))?;
        context
            .set(BRIDGE_BINDING, bridge)
            .map_err(|e| ViewError::execution(uri, e))?;

        let executable = view
            .executable(&self.runtime, self.config.compile)
            .map_err(|e| ViewError::execution(uri, e))?;
        executable
            .execute(&context)
            .map_err(|e| ViewError::execution(uri, e))
    }
}

/// Only a present value that is not a blank string replaces a default.
fn overrides_default(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::String(s) => !String::from_utf8_lossy(&s.as_bytes()).trim().is_empty(),
        _ => true,
    }
}
