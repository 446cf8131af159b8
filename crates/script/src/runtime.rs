//! Language selection and compilation.

use log::{debug, info};
use mlua::{Function, Lua, LuaSerdeExt, SerializeOptions, Table, Value};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::context::ScriptContext;
use crate::error::ScriptError;

/// Language ids served by the embedded Lua 5.4 runtime.
const LUA_LANGUAGES: &[&str] = &["lua", "lua5.4", "lua54"];

/// Registry slot holding the name of the source being compiled.
const SOURCE_NAME_KEY: &str = "xview.source_name";

/// Runtimes by lower-cased language id, created on first request.
#[derive(Default)]
pub struct RuntimeRegistry {
    runtimes: RwLock<HashMap<String, Arc<ScriptRuntime>>>,
}

static GLOBAL_REGISTRY: Lazy<Arc<RuntimeRegistry>> = Lazy::new(|| Arc::new(RuntimeRegistry::new()));

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A process-wide registry for engines that want to share runtimes.
    pub fn global() -> Arc<RuntimeRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    pub fn supports(language: &str) -> bool {
        let id = language.trim().to_ascii_lowercase();
        LUA_LANGUAGES.contains(&id.as_str())
    }

    /// Returns the runtime for `language`, creating it if needed.
    ///
    /// # Errors
    ///
    /// `ScriptError::RuntimeNotFound` for a language nothing can run.
    pub fn runtime(&self, language: &str) -> Result<Arc<ScriptRuntime>, ScriptError> {
        let id = language.trim().to_ascii_lowercase();
        if let Some(runtime) = self
            .runtimes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(runtime.clone());
        }

        if !Self::supports(&id) {
            return Err(ScriptError::RuntimeNotFound(language.to_string()));
        }

        let mut runtimes = self.runtimes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(runtime) = runtimes.get(&id) {
            return Ok(runtime.clone());
        }
        let runtime = Arc::new(ScriptRuntime::new(&id)?);
        runtimes.insert(id, runtime.clone());
        Ok(runtime)
    }
}

impl fmt::Debug for RuntimeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let runtimes = self.runtimes.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("RuntimeRegistry")
            .field("languages", &runtimes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// One embedded Lua state, shared by every view compiled for its language.
pub struct ScriptRuntime {
    language: String,
    lua: Lua,
    compilations: AtomicUsize,
}

impl ScriptRuntime {
    pub fn new(language: &str) -> Result<Self, ScriptError> {
        if !RuntimeRegistry::supports(language) {
            return Err(ScriptError::RuntimeNotFound(language.to_string()));
        }
        info!("Starting Lua runtime for language '{}'", language);
        Ok(Self {
            language: language.to_string(),
            lua: Lua::new(),
            compilations: AtomicUsize::new(0),
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// How many times source has been compiled ahead of time.
    pub fn compile_count(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Name of the source currently being compiled, if any.
    pub fn current_source_name(&self) -> Result<Option<String>, ScriptError> {
        Ok(self.lua.named_registry_value::<Option<String>>(SOURCE_NAME_KEY)?)
    }

    /// A fresh, empty context whose reads fall back to the globals.
    pub fn new_context(&self) -> Result<ScriptContext, ScriptError> {
        let table: Table = self
            .lua
            .load("return setmetatable({}, { __index = _G })")
            .set_name("=context")
            .eval()?;
        Ok(ScriptContext::new(table))
    }

    /// Converts a JSON value; `null` becomes `nil`.
    pub fn to_value(&self, value: &serde_json::Value) -> Result<Value, ScriptError> {
        let options = SerializeOptions::new()
            .serialize_none_to_null(false)
            .serialize_unit_to_null(false);
        Ok(self.lua.to_value_with(value, options)?)
    }

    /// Turns generated source into something that can be executed.
    ///
    /// With `try_compile`, the source is compiled once into a function taking
    /// its environment as a parameter, so it can run against any context.
    /// Otherwise the source is kept and loaded again on every execution.
    pub fn prepare(
        self: &Arc<Self>,
        try_compile: bool,
        source_name: &str,
        source: &str,
    ) -> Result<Executable, ScriptError> {
        if !try_compile {
            debug!("Preparing '{}' for interpretation", source_name);
            return Ok(Executable::Interpreted {
                runtime: self.clone(),
                name: source_name.to_string(),
                source: source.to_string(),
            });
        }

        let function = self.compile(source_name, source)?;
        Ok(Executable::Compiled {
            function,
            runtime: self.clone(),
        })
    }

    /// Compiles inside a single Lua call so the state lock is held while the
    /// source-name binding is swapped in and restored.
    fn compile(&self, source_name: &str, source: &str) -> Result<Function, ScriptError> {
        let name = source_name.to_string();
        let chunk_name = format!("@{}", source_name);
        let wrapped = format!("return function(_ENV) {}\nend", source);

        let compile = self.lua.create_function(move |lua, ()| {
            let previous: Option<String> = lua.named_registry_value(SOURCE_NAME_KEY)?;
            lua.set_named_registry_value(SOURCE_NAME_KEY, name.as_str())?;
            let compiled = lua
                .load(wrapped.as_str())
                .set_name(chunk_name.as_str())
                .eval::<Function>();
            lua.set_named_registry_value(SOURCE_NAME_KEY, previous)?;
            compiled
        })?;

        let function = compile.call::<Function>(())?;
        let count = self.compilations.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Compiled '{}' (compilation #{})", source_name, count);
        Ok(function)
    }
}

impl fmt::Debug for ScriptRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRuntime")
            .field("language", &self.language)
            .field("compilations", &self.compile_count())
            .finish()
    }
}

/// Prepared code, ready to run against a context.
pub enum Executable {
    /// Compiled once; runs directly.
    Compiled {
        function: Function,
        runtime: Arc<ScriptRuntime>,
    },
    /// Source loaded again on each run.
    Interpreted {
        runtime: Arc<ScriptRuntime>,
        name: String,
        source: String,
    },
}

impl Executable {
    pub fn is_compiled(&self) -> bool {
        matches!(self, Executable::Compiled { .. })
    }

    pub fn runtime(&self) -> &Arc<ScriptRuntime> {
        match self {
            Executable::Compiled { runtime, .. } | Executable::Interpreted { runtime, .. } => runtime,
        }
    }

    pub fn execute(&self, context: &ScriptContext) -> Result<(), ScriptError> {
        match self {
            Executable::Compiled { function, .. } => {
                function.call::<()>(context.table().clone())?;
            }
            Executable::Interpreted {
                runtime,
                name,
                source,
            } => {
                runtime
                    .lua()
                    .load(source.as_str())
                    .set_name(format!("@{}", name))
                    .set_environment(context.table().clone())
                    .exec()?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executable::Compiled { runtime, .. } => f
                .debug_struct("Compiled")
                .field("language", &runtime.language())
                .finish(),
            Executable::Interpreted { name, .. } => {
                f.debug_struct("Interpreted").field("name", name).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ContextPool;

    fn runtime() -> Arc<ScriptRuntime> {
        RuntimeRegistry::new().runtime("lua").unwrap()
    }

    #[test]
    fn test_registry_caches_case_insensitively() {
        let registry = RuntimeRegistry::new();
        let a = registry.runtime("lua").unwrap();
        let b = registry.runtime("LUA").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.runtime("Lua54").is_ok());
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = RuntimeRegistry::global().runtime("lua").unwrap();
        let b = RuntimeRegistry::global().runtime("lua54").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &RuntimeRegistry::global().runtime("LUA").unwrap()));
    }

    #[test]
    fn test_registry_rejects_unknown_language() {
        let err = RuntimeRegistry::new().runtime("javascript").unwrap_err();
        assert!(matches!(err, ScriptError::RuntimeNotFound(ref id) if id == "javascript"));
    }

    #[test]
    fn test_compiled_executable_runs_against_context() {
        let rt = runtime();
        let exe = rt.prepare(true, "/a.xview", "result = 1 + 2").unwrap();
        assert!(exe.is_compiled());
        assert_eq!(rt.compile_count(), 1);

        let ctx = rt.new_context().unwrap();
        exe.execute(&ctx).unwrap();
        assert_eq!(ctx.get("result").unwrap().as_i64(), Some(3));

        let other = rt.new_context().unwrap();
        exe.execute(&other).unwrap();
        assert_eq!(other.get("result").unwrap().as_i64(), Some(3));
        assert_eq!(rt.compile_count(), 1);
    }

    #[test]
    fn test_interpreted_executable_does_not_compile() {
        let rt = runtime();
        let exe = rt.prepare(false, "/a.xview", "result = string.upper('x')").unwrap();
        assert!(!exe.is_compiled());

        let ctx = rt.new_context().unwrap();
        exe.execute(&ctx).unwrap();
        assert_eq!(ctx.get("result").unwrap().as_str().as_deref(), Some("X"));
        assert_eq!(rt.compile_count(), 0);
    }

    #[test]
    fn test_context_sees_globals_but_writes_locally() {
        let rt = runtime();
        let ctx = rt.new_context().unwrap();
        rt.prepare(true, "t", "print = nil; n = tostring(5)")
            .unwrap()
            .execute(&ctx)
            .unwrap();

        let globals = rt.lua().globals();
        assert!(matches!(globals.get::<Value>("print").unwrap(), Value::Function(_)));
        assert!(matches!(globals.get::<Value>("n").unwrap(), Value::Nil));
        assert_eq!(ctx.get("n").unwrap().as_str().as_deref(), Some("5"));
    }

    #[test]
    fn test_syntax_error_is_reported_with_source_name() {
        let rt = runtime();
        let err = rt.prepare(true, "/broken.xview", "if then").unwrap_err();
        assert!(matches!(err, ScriptError::Lua(_)));
        assert!(err.to_string().contains("/broken.xview"));
        assert_eq!(rt.compile_count(), 0);
    }

    #[test]
    fn test_source_name_is_restored_after_compile() {
        let rt = runtime();
        assert_eq!(rt.current_source_name().unwrap(), None);
        rt.prepare(true, "/a.xview", "x = 1").unwrap();
        assert_eq!(rt.current_source_name().unwrap(), None);
        let _ = rt.prepare(true, "/b.xview", "if then");
        assert_eq!(rt.current_source_name().unwrap(), None);
    }

    #[test]
    fn test_context_clear_and_entries() {
        let rt = runtime();
        let ctx = rt.new_context().unwrap();
        ctx.set("a", "1").unwrap();
        ctx.set("b", 2).unwrap();

        let mut names: Vec<String> = ctx.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);

        ctx.clear().unwrap();
        assert!(ctx.is_empty().unwrap());
        rt.prepare(true, "t", "s = string.len('abc')").unwrap().execute(&ctx).unwrap();
        assert_eq!(ctx.get("s").unwrap().as_i64(), Some(3));
    }

    #[test]
    fn test_json_conversion() {
        let rt = runtime();
        let value = rt.to_value(&serde_json::json!({"n": 1, "list": [1, 2]})).unwrap();
        assert!(matches!(value, Value::Table(_)));
        assert!(matches!(rt.to_value(&serde_json::Value::Null).unwrap(), Value::Nil));
    }

    #[test]
    fn test_pool_of_script_contexts() {
        let rt = runtime();
        let factory_rt = rt.clone();
        let pool = ContextPool::new(2, move || factory_rt.new_context()).unwrap();

        {
            let ctx = pool.acquire().unwrap();
            ctx.set("leftover", true).unwrap();
        }
        assert_eq!(pool.len(), 2);
        for _ in 0..2 {
            let ctx = pool.acquire().unwrap();
            assert!(ctx.is_empty().unwrap());
        }
    }
}
