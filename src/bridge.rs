//! The `xview` object seen by generated code.

use log::trace;
use mlua::{Function, Lua, Table, UserData, UserDataMethods, Value};
use std::sync::{Arc, Weak};
use xview_document::uri;
use xview_document::vocabulary::VIEW_EXTENSION;
use xview_script::ScriptContext;

use crate::engine::EngineShared;
use crate::error::ViewError;
use crate::sink::OutputSink;
use crate::view::View;

/// Host callbacks for one render: output, path arithmetic and calls into
/// other views.
///
/// Holds the engine weakly; contexts outlive renders in the pool and must not
/// keep the engine alive.
pub(crate) struct Bridge {
    pub(crate) engine: Weak<EngineShared>,
    pub(crate) view: Arc<View>,
    pub(crate) context: ScriptContext,
    pub(crate) sink: OutputSink,
    pub(crate) depth: usize,
}

impl Bridge {
    fn print(&self, lua: &Lua, value: Value) -> mlua::Result<()> {
        if value.is_nil() {
            return Ok(());
        }
        let tostring: Function = lua.globals().get("tostring")?;
        let text: mlua::String = tostring.call(value)?;
        self.sink
            .write_all(&text.as_bytes())
            .map_err(mlua::Error::external)
    }

    /// Renders `tag` from the directory of `base` into the same sink.
    ///
    /// The callee sees the caller's variables and the call attributes (call
    /// attributes win), filtered through its own attribute declarations.
    fn execute(
        &self,
        base: &str,
        tag: &str,
        call_attributes: Option<Table>,
        children: Option<String>,
    ) -> Result<(), ViewError> {
        let engine = self
            .engine
            .upgrade()
            .ok_or_else(|| ViewError::Config("view engine dropped during render".to_string()))?;

        let target = uri::normalize(&uri::resolve(base, &format!("{}{}", tag, VIEW_EXTENSION)));
        trace!("'{}' invokes '{}'", self.view.uri(), target);
        let view = engine.load(&target)?;

        let mut scope = self
            .context
            .entries()
            .map_err(|e| ViewError::execution(self.view.uri(), e))?;
        if let Some(call_attributes) = call_attributes {
            for pair in call_attributes.pairs::<String, Value>() {
                let (name, value) = pair.map_err(|e| ViewError::execution(self.view.uri(), e))?;
                scope.retain(|(existing, _)| existing != &name);
                scope.push((name, value));
            }
        }

        engine.render_scoped(&view, scope, &self.sink, children, self.depth + 1)
    }
}

/// Lua truthiness extended with the empty string, zero and NaN.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Boolean(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.as_bytes().is_empty(),
        _ => true,
    }
}

impl UserData for Bridge {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("print", |lua, this, value: Value| this.print(lua, value));

        methods.add_method("path", |_, this, (first, second): (String, Option<String>)| {
            Ok(match second {
                Some(relative) => uri::resolve(&first, &relative),
                None => uri::resolve(this.view.uri(), &first),
            })
        });

        methods.add_method(
            "execute",
            |_, this, (base, tag, attrs, children): (String, String, Option<Table>, Option<String>)| {
                this.execute(&base, &tag, attrs, children)
                    .map_err(mlua::Error::external)
            },
        );

        methods.add_method("truthy", |_, _, value: Value| Ok(truthy(&value)));

        methods.add_method("uri", |_, this, ()| Ok(this.view.uri().to_string()));
    }
}
