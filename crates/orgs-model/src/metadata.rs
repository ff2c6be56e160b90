//! Free-form organization metadata
//!
//! Metadata is an opaque JSON object with no fixed schema. Listing filters
//! compare it by containment: a filter matches when every key it names is
//! present with a contained value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form key/value metadata attached to an organization.
///
/// # Examples
///
/// ```
/// use orgs_model::Metadata;
/// use serde_json::json;
///
/// let meta = Metadata::from_value(json!({"region": "eu", "tier": {"plan": "pro"}})).unwrap();
/// let filter = Metadata::from_value(json!({"tier": {"plan": "pro"}})).unwrap();
/// assert!(meta.contains(&filter));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    /// Creates empty metadata.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builds metadata from a JSON value.
    ///
    /// # Returns
    ///
    /// `Some(Metadata)` if the value is an object, `None` otherwise
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Insert a key, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Check whether `filter` is contained in this metadata.
    ///
    /// Objects match by key subset (recursively), arrays match when every
    /// filter element is contained in some element, scalars match by equality.
    /// An empty filter matches everything.
    pub fn contains(&self, filter: &Metadata) -> bool {
        object_contains(&self.0, &filter.0)
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn object_contains(target: &Map<String, Value>, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(key, expected)| {
        target
            .get(key)
            .map(|actual| value_contains(actual, expected))
            .unwrap_or(false)
    })
}

fn value_contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(a), Value::Object(e)) => object_contains(a, e),
        (Value::Array(a), Value::Array(e)) => e
            .iter()
            .all(|wanted| a.iter().any(|have| value_contains(have, wanted))),
        (a, e) => a == e,
    }
}
