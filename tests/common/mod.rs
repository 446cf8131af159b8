pub mod fixtures;

use serde_json::Value;
use std::sync::Arc;
use xview::{Attributes, InMemoryViewLoader, View, ViewEngine, ViewError};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Build an engine over an in-memory set of views
pub fn engine_with<S: AsRef<str>>(views: &[(&str, S)]) -> Result<ViewEngine, Box<dyn std::error::Error>> {
    Ok(ViewEngine::new(loader_with(views)?)?)
}

/// An in-memory loader holding the given views
pub fn loader_with<S: AsRef<str>>(
    views: &[(&str, S)],
) -> Result<Arc<InMemoryViewLoader>, Box<dyn std::error::Error>> {
    let loader = InMemoryViewLoader::new();
    for (uri, source) in views {
        loader.add(*uri, source.as_ref())?;
    }
    Ok(Arc::new(loader))
}

/// Turn a JSON object literal into render attributes
pub fn attrs(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

/// Load `uri` and render it with the given attributes
pub fn render(engine: &ViewEngine, uri: &str, attributes: Value) -> Result<String, ViewError> {
    let view = engine.load(uri)?;
    render_view(engine, &view, attributes)
}

pub fn render_view(engine: &ViewEngine, view: &Arc<View>, attributes: Value) -> Result<String, ViewError> {
    engine.render_to_string(view, &attrs(attributes))
}
