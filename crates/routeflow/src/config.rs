//! Process-wide configuration exposed to handlers.
//!
//! The engine treats configuration loading as an external collaborator; it
//! only offers the narrow read interface. Values are written before serving
//! starts and shared read-only afterwards, so concurrent dispatches need no
//! locking.

use std::collections::HashMap;

/// Read-only key/value configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value. Only meaningful before the owning router starts
    /// serving.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Reads a value.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        self.values.get(key.as_ref()).map(String::as_str)
    }

    /// Reads a value, falling back to `default` when absent.
    pub fn get_or<'a>(&'a self, key: impl AsRef<str>, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn set_and_get() {
        let mut config = Config::new();
        config.set("app.name", "demo").set("app.debug", "true");
        assert_eq!(config.get("app.name"), Some("demo"));
        assert!(config.get("app.missing").is_none());
        assert_eq!(config.get_or("app.missing", "fallback"), "fallback");
    }

    #[test]
    fn from_pairs() {
        let config: Config = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(config.get("b"), Some("2"));
    }
}
