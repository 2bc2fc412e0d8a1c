//! Edge entities: a backend edge handle viewed together with its endpoints.

use nosqlmap_core::{Element, MappingError, Value, require_key, require_value};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Driver contract for a persisted graph edge.
///
/// Implementations are handles into backend state, so mutation goes through
/// `&self`. Handle equality is edge identity.
pub trait EdgeHandle: Eq + Hash + fmt::Debug {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Backend-assigned identifier.
    fn id(&self) -> Value;

    fn label(&self) -> String;

    /// Property keys in the backend's enumeration order.
    fn keys(&self) -> Result<Vec<String>, Self::Error>;

    fn property(&self, key: &str) -> Result<Option<Value>, Self::Error>;

    /// Write or overwrite one property.
    fn set_property(&self, key: &str, value: Value) -> Result<(), Self::Error>;

    fn remove_property(&self, key: &str) -> Result<(), Self::Error>;
}

/// A graph edge between an inbound entity `IN` and an outbound entity `OUT`.
///
/// The view never creates or deletes the underlying edge. Property writes go
/// straight to the handle; reads always hit the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeEntity<IN, OUT, E> {
    edge: E,
    inbound: IN,
    outbound: OUT,
}

impl<IN, OUT, E: EdgeHandle> EdgeEntity<IN, OUT, E> {
    /// Wrap an already-persisted edge.
    pub fn new(edge: E, inbound: IN, outbound: OUT) -> Self {
        Self {
            edge,
            inbound,
            outbound,
        }
    }

    pub fn id(&self) -> Value {
        self.edge.id()
    }

    pub fn label(&self) -> String {
        self.edge.label()
    }

    pub fn inbound(&self) -> &IN {
        &self.inbound
    }

    pub fn outbound(&self) -> &OUT {
        &self.outbound
    }

    /// Underlying driver handle.
    pub fn edge(&self) -> &E {
        &self.edge
    }

    /// Snapshot of every property currently on the edge.
    ///
    /// Each call re-reads the backend. A key that disappears between listing
    /// and reading is left out.
    pub fn properties(&self) -> Result<Arc<[Element]>, MappingError> {
        let keys = self.edge.keys().map_err(MappingError::backend)?;
        let mut elements = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.edge.property(&key).map_err(MappingError::backend)? {
                elements.push(Element::snapshot(key, value));
            }
        }
        tracing::trace!(edge = ?self.edge, count = elements.len(), "read edge properties");
        Ok(elements.into())
    }

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// Accepts a ready [`Value`] or anything convertible into one.
    pub fn add(&self, key: &str, value: impl Into<Value>) -> Result<(), MappingError> {
        let value = value.into();
        require_key(key)?;
        require_value(&value)?;
        tracing::debug!(edge = ?self.edge, key, kind = value.kind(), "set edge property");
        self.edge
            .set_property(key, value)
            .map_err(MappingError::backend)
    }

    /// Remove `key` if present. Absent keys are a no-op.
    pub fn remove(&self, key: &str) -> Result<(), MappingError> {
        require_key(key)?;
        if self
            .edge
            .property(key)
            .map_err(MappingError::backend)?
            .is_none()
        {
            return Ok(());
        }
        tracing::debug!(edge = ?self.edge, key, "remove edge property");
        self.edge
            .remove_property(key)
            .map_err(MappingError::backend)
    }

    /// Current value under `key`.
    pub fn get(&self, key: &str) -> Result<Option<Value>, MappingError> {
        require_key(key)?;
        self.edge.property(key).map_err(MappingError::backend)
    }

    /// Number of properties currently on the edge.
    pub fn size(&self) -> Result<usize, MappingError> {
        self.edge
            .keys()
            .map(|keys| keys.len())
            .map_err(MappingError::backend)
    }

    pub fn is_empty(&self) -> Result<bool, MappingError> {
        self.size().map(|size| size == 0)
    }

    pub fn into_parts(self) -> (E, IN, OUT) {
        (self.edge, self.inbound, self.outbound)
    }
}

impl<IN: fmt::Debug, OUT: fmt::Debug, E: fmt::Debug> fmt::Display for EdgeEntity<IN, OUT, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EdgeEntity{{outbound={:?}, edge={:?}, inbound={:?}}}",
            self.outbound, self.edge, self.inbound
        )
    }
}
