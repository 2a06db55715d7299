//! Node Attributes
//!
//! Flat string-keyed facts about a node, as collected by the caller
//! (grains, inventory facts, ...).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::debug;

/// Prefix of attribute keys that never take part in classification
pub const RESERVED_PREFIX: &str = "__";

/// Observed node attributes, rendered to strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAttributes(IndexMap<String, String>);

impl NodeAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build attributes from a YAML mapping
    ///
    /// Scalars are kept in their string form, booleans as `True` / `False`
    /// (the spelling grain values compare against). Nulls, sequences and
    /// mappings are dropped, so placeholders naming them stay unresolved.
    pub fn from_yaml(value: &Value) -> Self {
        let mut attrs = Self::new();
        let Value::Mapping(mapping) = value else {
            return attrs;
        };

        for (key, value) in mapping {
            let Some(key) = scalar_to_string(key) else {
                continue;
            };
            match attribute_value(value) {
                Some(rendered) => {
                    attrs.insert(key, rendered);
                }
                None => debug!(attribute = %key, "Skipping non-scalar attribute"),
            }
        }

        attrs
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of these attributes without keys starting with `prefix`
    pub fn without_reserved(&self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self.clone();
        }
        self.0
            .iter()
            .filter(|(key, _)| !key.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NodeAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// String form of a YAML scalar, `None` for null and collections
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Attribute form of a YAML value
fn attribute_value(value: &Value) -> Option<String> {
    match value {
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Tagged(tagged) => attribute_value(&tagged.value),
        other => scalar_to_string(other),
    }
}
