//! Optional pre-parse validation hook.

/// Validates raw view source before it is parsed and compiled.
///
/// The engine itself ships no schema engine; hosts that want XML Schema
/// validation plug one in here and enable `validateSchema` in the engine
/// configuration.
pub trait DocumentValidator: Send + Sync {
    /// Returns a human-readable message describing the first violation.
    fn validate(&self, uri: &str, source: &str) -> Result<(), String>;
}

impl<F> DocumentValidator for F
where
    F: Fn(&str, &str) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, uri: &str, source: &str) -> Result<(), String> {
        self(uri, source)
    }
}
