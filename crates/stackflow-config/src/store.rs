//! Namespaced key-value configuration

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// On-disk layout of a `Stackflow.<stack>.yaml` file
#[derive(Debug, Default, Deserialize)]
struct StackConfigFile {
    #[serde(default)]
    config: BTreeMap<String, Value>,
}

/// All configuration values of one stack, keyed by `<namespace>:<key>`
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    values: BTreeMap<String, Value>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a stack configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let store = Self::from_yaml_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(
            path = %path.display(),
            values = store.len(),
            "Loaded stack configuration"
        );
        Ok(store)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty file is a valid, empty configuration
        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        let file: StackConfigFile = serde_yaml::from_str(content)?;
        let mut store = Self::new();
        for (key, value) in file.config {
            store.set(key, value)?;
        }
        Ok(store)
    }

    /// Build a store from `(key, value)` pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut store = Self::new();
        for (key, value) in pairs {
            store.set(key, value)?;
        }
        Ok(store)
    }

    /// Set a value. The key must be namespaced (`aws:region`).
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        split_key(&key)?;
        self.values.insert(key, value.into());
        Ok(())
    }

    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    match key.split_once(':') {
        Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
            Ok((namespace, name))
        }
        _ => Err(ConfigError::InvalidKey(key.to_string())),
    }
}

/// Render a YAML value the way `Config::get` reports it
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => serde_json::to_value(other)
            .ok()
            .map(|json| json.to_string()),
    }
}

/// Read-only view of a [`ConfigStore`] bound to one namespace
///
/// The namespace is the project name for program settings, or a provider
/// package (`aws`, `gcp`, `azure-native`) for provider settings.
#[derive(Debug, Clone)]
pub struct Config {
    store: Arc<ConfigStore>,
    namespace: String,
}

impl Config {
    pub fn new(store: Arc<ConfigStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.store
            .get_raw(&self.full_key(key))
            .and_then(render_value)
    }

    /// Get a value, falling back to `default` when it is unset or empty
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn require(&self, key: &str) -> Result<String> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingRequiredKey(self.full_key(key)))
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => match raw.as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(ConfigError::InvalidValue {
                    key: self.full_key(key),
                    expected: "boolean",
                    value: raw,
                }),
            },
        }
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    key: self.full_key(key),
                    expected: "integer",
                    value: raw,
                }),
        }
    }

    /// Deserialize a structured value
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get_raw(&self.full_key(key)) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_yaml::from_value(value.clone())?)),
        }
    }
}
