//! Resource argument trees.
//!
//! Declaration arguments mix plain configuration values with deferred outputs
//! of earlier declarations (an id, a location). [`Input`] holds either, nested
//! the way provider arguments nest, and resolves the whole tree to JSON once
//! every output it depends on is known.

use std::collections::BTreeMap;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::{Map, Value};

use crate::error::OutputError;
use crate::output::Output;

/// A possibly-deferred argument value.
#[derive(Debug, Clone)]
pub enum Input {
    Value(Value),
    Deferred(Output<Value>),
    List(Vec<Input>),
    Object(BTreeMap<String, Input>),
}

impl Input {
    /// Resolve the tree, waiting on every deferred leaf.
    pub fn resolve(&self) -> BoxFuture<'static, Result<Value, OutputError>> {
        match self {
            Input::Value(v) => future::ready(Ok(v.clone())).boxed(),
            Input::Deferred(out) => {
                let out = out.clone();
                async move { out.resolve().await }.boxed()
            }
            Input::List(items) => {
                let pending: Vec<_> = items.iter().map(Input::resolve).collect();
                async move { Ok(Value::Array(future::try_join_all(pending).await?)) }.boxed()
            }
            Input::Object(fields) => {
                let keys: Vec<String> = fields.keys().cloned().collect();
                let pending: Vec<_> = fields.values().map(Input::resolve).collect();
                async move {
                    let values = future::try_join_all(pending).await?;
                    Ok(Value::Object(keys.into_iter().zip(values).collect()))
                }
                .boxed()
            }
        }
    }

    /// True when no leaf depends on a deferred output.
    pub fn is_known(&self) -> bool {
        match self {
            Input::Value(_) => true,
            Input::Deferred(_) => false,
            Input::List(items) => items.iter().all(Input::is_known),
            Input::Object(fields) => fields.values().all(Input::is_known),
        }
    }

    /// The plain value, when the input is not deferred.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Input::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for Input {
    fn from(v: Value) -> Self {
        Input::Value(v)
    }
}

impl From<&str> for Input {
    fn from(s: &str) -> Self {
        Input::Value(Value::String(s.to_string()))
    }
}

impl From<String> for Input {
    fn from(s: String) -> Self {
        Input::Value(Value::String(s))
    }
}

impl From<&String> for Input {
    fn from(s: &String) -> Self {
        Input::Value(Value::String(s.clone()))
    }
}

impl From<bool> for Input {
    fn from(b: bool) -> Self {
        Input::Value(Value::Bool(b))
    }
}

impl From<u16> for Input {
    fn from(n: u16) -> Self {
        Input::Value(Value::from(n))
    }
}

impl From<u32> for Input {
    fn from(n: u32) -> Self {
        Input::Value(Value::from(n))
    }
}

impl From<Output<Value>> for Input {
    fn from(out: Output<Value>) -> Self {
        Input::Deferred(out)
    }
}

impl From<Output<String>> for Input {
    fn from(out: Output<String>) -> Self {
        Input::Deferred(out.map(Value::String))
    }
}

impl From<&Output<String>> for Input {
    fn from(out: &Output<String>) -> Self {
        Input::Deferred(out.map(Value::String))
    }
}

impl From<ResourceArgs> for Input {
    fn from(args: ResourceArgs) -> Self {
        Input::Object(args.props)
    }
}

impl From<BTreeMap<String, String>> for Input {
    fn from(map: BTreeMap<String, String>) -> Self {
        Input::Object(map.into_iter().map(|(k, v)| (k, Input::from(v))).collect())
    }
}

impl<T: Into<Input>> From<Vec<T>> for Input {
    fn from(items: Vec<T>) -> Self {
        Input::List(items.into_iter().map(Into::into).collect())
    }
}

/// Arguments of one declaration.
#[derive(Debug, Clone, Default)]
pub struct ResourceArgs {
    props: BTreeMap<String, Input>,
}

impl ResourceArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Input>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Set `key` only when `value` is present.
    pub fn set_opt<V: Into<Input>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Input> {
        self.props.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.props.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Resolve every argument to a JSON object.
    pub async fn resolve(&self) -> Result<Map<String, Value>, OutputError> {
        let keys: Vec<String> = self.props.keys().cloned().collect();
        let values = future::try_join_all(self.props.values().map(Input::resolve)).await?;
        Ok(keys.into_iter().zip(values).collect())
    }
}
