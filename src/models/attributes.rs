//! Free-form attribute bag carried by templates, components, commands and projects.
//!
//! Attributes are stored as raw JSON values so that unknown keys survive a
//! resolve round-trip untouched. The typed accessors decode on demand and
//! report malformed values as [`FlattenError::InvalidAttribute`] instead of
//! silently falling back to a default.

use crate::core::{FlattenError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// String-keyed map of arbitrary JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Value>);

impl Attributes {
    /// Create an empty attribute bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `key` is set, regardless of its value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set `key` to an arbitrary value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Set `key` to a string value.
    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), Value::String(value.into()));
    }

    /// Remove `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Iterate over attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Copy every attribute of `other` into `self`; keys in `other` win.
    pub fn extend_from(&mut self, other: &Attributes) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Read `key` as a boolean.
    ///
    /// Missing keys read as `false`. Both JSON booleans and the strings
    /// `"true"` / `"false"` are accepted; anything else is an error.
    ///
    /// `element` names the owner of the bag and only appears in error messages.
    pub fn get_bool(&self, key: &str, element: &str) -> Result<bool> {
        match self.0.get(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(invalid(key, element, format!("'{other}' is not true or false"))),
            },
            Some(other) => Err(invalid(key, element, format!("{other} is not true or false"))),
        }
    }

    /// Read `key` as a string, `None` when unset.
    pub fn get_string(&self, key: &str, element: &str) -> Result<Option<String>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(invalid(key, element, format!("{other} is not a string"))),
        }
    }

    /// Decode `key` into `T`, `None` when unset.
    pub fn get_into<T: DeserializeOwned>(&self, key: &str, element: &str) -> Result<Option<T>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| invalid(key, element, e.to_string())),
        }
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn invalid(key: &str, element: &str, reason: String) -> FlattenError {
    FlattenError::InvalidAttribute {
        key: key.to_string(),
        element: element.to_string(),
        reason,
    }
}
