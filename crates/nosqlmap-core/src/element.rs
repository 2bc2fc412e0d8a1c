//! Key/value property entries.

use crate::error::{MappingError, require_key, require_value};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of a property bag: a key paired with a value snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    key: String,
    value: Value,
}

impl Element {
    /// Build an entry, rejecting blank keys and null values.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Result<Self, MappingError> {
        let key = key.into();
        let value = value.into();
        require_key(&key)?;
        require_value(&value)?;
        Ok(Self { key, value })
    }

    /// Build an entry from a value read back from a driver.
    ///
    /// No argument checks: a snapshot reports whatever the backend holds.
    pub fn snapshot(key: String, value: Value) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.key, self.value)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}
