//! Stack configuration store and namespaced readers.
//!
//! Values are kept as raw JSON text under fully-qualified `namespace:key`
//! names, the same shape a Pulumi stack file uses. Decoding into typed
//! records happens on read.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Flat key/value configuration store.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    values: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct StackFile {
    #[serde(default)]
    config: BTreeMap<String, serde_yaml::Value>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(qualified key, raw value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Read the `config:` section of a stack file.
    pub fn from_stack_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        debug!("Reading stack file from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_stack_yaml(&content)
    }

    /// Parse stack YAML. String values are kept verbatim as JSON text,
    /// structured values are re-encoded as JSON.
    pub fn from_stack_yaml(content: &str) -> ConfigResult<Self> {
        let stack: StackFile = serde_yaml::from_str(content)?;

        let mut store = Self::new();
        for (key, value) in stack.config {
            let raw = match value {
                serde_yaml::Value::String(s) => s,
                other => serde_json::to_string(&other).map_err(|e| {
                    ConfigError::Invalid(format!("value of {} is not JSON-compatible: {}", key, e))
                })?,
            };
            store.insert(key, raw);
        }

        debug!("Loaded {} config keys", store.len());
        Ok(store)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Namespaced view over this store.
    pub fn namespace(&self, namespace: impl Into<String>) -> Config<'_> {
        Config::new(self, namespace)
    }
}

/// Reader for the keys of one namespace.
#[derive(Debug, Clone)]
pub struct Config<'a> {
    store: &'a ConfigStore,
    namespace: String,
}

impl<'a> Config<'a> {
    pub fn new(store: &'a ConfigStore, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fully-qualified name of `key`.
    pub fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Raw value of `key`, if set.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.store.get(&self.full_key(key))
    }

    /// Decode `key` as JSON. An absent key yields `None`; a present key that
    /// does not decode is an error.
    pub fn try_object<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<Option<T>> {
        let full_key = self.full_key(key);
        let Some(raw) = self.store.get(&full_key) else {
            debug!("Config key {} not set", full_key);
            return Ok(None);
        };

        serde_json::from_str(raw)
            .map(Some)
            .map_err(|source| ConfigError::Decode {
                key: full_key,
                source,
            })
    }

    /// Decode `key`, failing if it is absent.
    pub fn require_object<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<T> {
        self.try_object(key)?
            .ok_or_else(|| ConfigError::MissingKey(self.full_key(key)))
    }

    /// Decode `key`, falling back to `T::default()` when absent.
    pub fn object_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> ConfigResult<T> {
        Ok(self.try_object(key)?.unwrap_or_default())
    }
}
