use std::collections::HashMap;
use crate::errors::{Result, RuntimeError};

/// String keyed settings of the runtime or of one plugin.
///
/// Values are kept as strings and converted on lookup, a malformed value
/// is reported as `InvalidConfig` at the point it is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn string_value(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_owned()
    }

    pub fn int_value(&self, key: &str, default: i64) -> Result<i64> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        raw.trim()
            .parse::<i64>()
            .map_err(|_| RuntimeError::InvalidConfig(format!("setting \"{}\" is not an integer: \"{}\"", key, raw)))
    }

    /// Collect the process environment variables starting with `prefix`,
    /// e.g. `AX25_TICK=50` becomes `tick = 50` for prefix `AX25_`.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    pub(crate) fn from_vars<I>(prefix: &str, vars: I) -> Self
    where I: IntoIterator<Item = (String, String)>
    {
        let values = vars.into_iter()
            .filter_map(|(key, value)| {
                let key = key.strip_prefix(prefix)?;
                if key.is_empty() {
                    return None;
                }
                Some((key.to_lowercase(), value))
            })
            .collect();
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::RuntimeError;
    use super::Settings;

    #[test]
    fn lookup_with_defaults() {
        let settings = Settings::new()
            .with("tick", " 40 ")
            .with("loglevel", "DEBUG");

        assert_eq!(settings.int_value("tick", 100).unwrap(), 40);
        assert_eq!(settings.int_value("missing", 100).unwrap(), 100);
        assert_eq!(settings.string_value("loglevel", "NONE"), "DEBUG");
        assert_eq!(settings.string_value("missing", "NONE"), "NONE");
    }

    #[test]
    fn malformed_integer() {
        let settings = Settings::new().with("tick", "100ms");
        let err = settings.int_value("tick", 100).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidConfig(_)));
    }

    #[test]
    fn from_prefixed_vars() {
        let vars = vec![
            ("AX25_TICK".to_string(), "50".to_string()),
            ("AX25_LOGLEVEL".to_string(), "INFO".to_string()),
            ("AX25_".to_string(), "ignored".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ];
        let settings = Settings::from_vars("AX25_", vars);
        assert_eq!(settings.len(), 2);
        assert_eq!(settings.get("tick"), Some("50"));
        assert_eq!(settings.get("loglevel"), Some("INFO"));
    }
}
