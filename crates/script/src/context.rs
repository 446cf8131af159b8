use mlua::{IntoLua, Table, Value};

use crate::error::ScriptError;
use crate::pool::PooledContext;

/// The variable scope of one execution.
///
/// A Lua table used as the chunk's `_ENV`. Its metatable falls back to the
/// runtime's globals for reads, so the standard library stays visible while
/// every assignment lands in the context itself.
#[derive(Debug, Clone)]
pub struct ScriptContext {
    table: Table,
}

impl ScriptContext {
    pub(crate) fn new(table: Table) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn set(&self, name: &str, value: impl IntoLua) -> Result<(), ScriptError> {
        Ok(self.table.raw_set(name, value)?)
    }

    pub fn get(&self, name: &str) -> Result<Value, ScriptError> {
        Ok(self.table.raw_get(name)?)
    }

    /// Snapshot of the string-keyed entries, as seen by nested views.
    pub fn entries(&self) -> Result<Vec<(String, Value)>, ScriptError> {
        let mut entries = Vec::new();
        for pair in self.table.clone().pairs::<Value, Value>() {
            let (key, value) = pair?;
            if let Value::String(key) = key {
                entries.push((key.to_string_lossy().to_string(), value));
            }
        }
        Ok(entries)
    }

    /// Removes every entry; the globals fallback stays in place.
    pub fn clear(&self) -> Result<(), ScriptError> {
        let keys = self
            .table
            .clone()
            .pairs::<Value, Value>()
            .map(|pair| pair.map(|(key, _)| key))
            .collect::<mlua::Result<Vec<_>>>()?;
        for key in keys {
            self.table.raw_set(key, Value::Nil)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> Result<bool, ScriptError> {
        Ok(self.table.clone().pairs::<Value, Value>().next().is_none())
    }
}

impl PooledContext for ScriptContext {
    type Error = ScriptError;

    fn reset(&mut self) -> Result<(), ScriptError> {
        self.clear()
    }
}
