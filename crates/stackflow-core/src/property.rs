//! Property bags
//!
//! Resource properties form a JSON-like tree whose leaves may be deferred
//! outputs of other declarations.

use crate::error::Result;
use crate::output::{Output, OutputExpr, ResolvedOutputs};
use crate::stack::Urn;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A node of a property tree
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Value(Value),
    Output(OutputExpr),
    Array(Vec<PropertyValue>),
    Object(PropertyMap),
}

impl PropertyValue {
    pub fn null() -> Self {
        PropertyValue::Value(Value::Null)
    }

    pub fn dependencies(&self) -> BTreeSet<Urn> {
        let mut deps = BTreeSet::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    fn collect_dependencies(&self, deps: &mut BTreeSet<Urn>) {
        match self {
            PropertyValue::Value(_) => {}
            PropertyValue::Output(expr) => expr.collect_dependencies(deps),
            PropertyValue::Array(items) => {
                for item in items {
                    item.collect_dependencies(deps);
                }
            }
            PropertyValue::Object(map) => {
                for value in map.values() {
                    value.collect_dependencies(deps);
                }
            }
        }
    }

    /// The literal value, if nothing in the subtree is deferred
    pub fn known_value(&self) -> Option<Value> {
        match self {
            PropertyValue::Value(value) => Some(value.clone()),
            PropertyValue::Output(expr) => expr.known_value(),
            PropertyValue::Array(items) => items
                .iter()
                .map(PropertyValue::known_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            PropertyValue::Object(map) => map.known_value(),
        }
    }

    pub fn resolve(&self, outputs: &dyn ResolvedOutputs) -> Result<Value> {
        match self {
            PropertyValue::Value(value) => Ok(value.clone()),
            PropertyValue::Output(expr) => expr.resolve(outputs),
            PropertyValue::Array(items) => items
                .iter()
                .map(|item| item.resolve(outputs))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            PropertyValue::Object(map) => map.resolve(outputs),
        }
    }

    fn describe(&self) -> Value {
        match self {
            PropertyValue::Value(value) => value.clone(),
            PropertyValue::Output(expr) => expr.describe(),
            PropertyValue::Array(items) => {
                Value::Array(items.iter().map(PropertyValue::describe).collect())
            }
            PropertyValue::Object(map) => map.describe(),
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.describe().serialize(serializer)
    }
}

macro_rules! literal_property {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::Value(Value::from(value))
                }
            }
        )*
    };
}

literal_property!(&str, String, bool, i32, i64, u32, u64, f64);

impl From<&String> for PropertyValue {
    fn from(value: &String) -> Self {
        PropertyValue::Value(Value::String(value.clone()))
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::Value(value)
    }
}

impl<T> From<Output<T>> for PropertyValue {
    fn from(output: Output<T>) -> Self {
        match output.into_expr() {
            OutputExpr::Known(value) => PropertyValue::Value(value),
            expr => PropertyValue::Output(expr),
        }
    }
}

impl<T> From<&Output<T>> for PropertyValue {
    fn from(output: &Output<T>) -> Self {
        output.clone().into()
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(map: PropertyMap) -> Self {
        PropertyValue::Object(map)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(items: Vec<T>) -> Self {
        PropertyValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<PropertyValue>> From<BTreeMap<String, V>> for PropertyValue {
    fn from(map: BTreeMap<String, V>) -> Self {
        let mut props = PropertyMap::new();
        for (key, value) in map {
            props.insert(key, value);
        }
        PropertyValue::Object(props)
    }
}

impl<V: Into<PropertyValue>> From<HashMap<String, V>> for PropertyValue {
    fn from(map: HashMap<String, V>) -> Self {
        map.into_iter().collect::<BTreeMap<_, _>>().into()
    }
}

/// Ordered property bag
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: BTreeMap<String, PropertyValue>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert only when `value` is set
    pub fn with_opt<V: Into<PropertyValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    /// Literal string at `key`, if it is known at declaration time
    pub fn known_str(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(PropertyValue::known_value)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &PropertyValue> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dependencies(&self) -> BTreeSet<Urn> {
        let mut deps = BTreeSet::new();
        for value in self.entries.values() {
            value.collect_dependencies(&mut deps);
        }
        deps
    }

    pub fn known_value(&self) -> Option<Value> {
        let mut object = Map::new();
        for (key, value) in &self.entries {
            object.insert(key.clone(), value.known_value()?);
        }
        Some(Value::Object(object))
    }

    pub fn resolve(&self, outputs: &dyn ResolvedOutputs) -> Result<Value> {
        let mut object = Map::new();
        for (key, value) in &self.entries {
            object.insert(key.clone(), value.resolve(outputs)?);
        }
        Ok(Value::Object(object))
    }

    fn describe(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.describe()))
                .collect(),
        )
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.describe().serialize(serializer)
    }
}
