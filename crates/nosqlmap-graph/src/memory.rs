//! In-memory property graph driver.
//!
//! A reference backend for the edge adapter: vertices and labelled edges with
//! property maps, shared behind one lock. Property keys enumerate in sorted
//! order.

use nosqlmap_core::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::edge::EdgeHandle;

/// Errors raised by the in-memory graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("edge {0} has been removed")]
    EdgeRemoved(u64),

    #[error("vertex not found: {0}")]
    VertexNotFound(u64),

    #[error("graph lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone)]
struct VertexRecord {
    label: String,
}

#[derive(Debug, Clone)]
struct EdgeRecord {
    label: String,
    outbound: u64,
    inbound: u64,
    properties: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct GraphState {
    next_id: u64,
    vertices: BTreeMap<u64, VertexRecord>,
    edges: BTreeMap<u64, EdgeRecord>,
}

impl GraphState {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared in-memory graph. Clones address the same graph.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    state: Arc<RwLock<GraphState>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, GraphState>, GraphError> {
        self.state.read().map_err(|_| GraphError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, GraphState>, GraphError> {
        self.state.write().map_err(|_| GraphError::Poisoned)
    }

    /// Add a vertex and return its id.
    pub fn add_vertex(&self, label: impl Into<String>) -> Result<u64, GraphError> {
        let mut state = self.write()?;
        let id = state.allocate();
        let label = label.into();
        tracing::trace!(id, label = %label, "add vertex");
        state.vertices.insert(id, VertexRecord { label });
        Ok(id)
    }

    pub fn vertex_label(&self, id: u64) -> Result<String, GraphError> {
        self.read()?
            .vertices
            .get(&id)
            .map(|vertex| vertex.label.clone())
            .ok_or(GraphError::VertexNotFound(id))
    }

    /// Connect `outbound -> inbound` with a labelled edge.
    pub fn add_edge(
        &self,
        outbound: u64,
        label: impl Into<String>,
        inbound: u64,
    ) -> Result<MemoryEdge, GraphError> {
        let mut state = self.write()?;
        for vertex in [outbound, inbound] {
            if !state.vertices.contains_key(&vertex) {
                return Err(GraphError::VertexNotFound(vertex));
            }
        }
        let id = state.allocate();
        let label = label.into();
        tracing::debug!(id, outbound, inbound, label = %label, "add edge");
        state.edges.insert(
            id,
            EdgeRecord {
                label: label.clone(),
                outbound,
                inbound,
                properties: BTreeMap::new(),
            },
        );
        Ok(MemoryEdge {
            graph: self.clone(),
            id,
            label,
        })
    }

    /// Handle for an existing edge.
    pub fn edge(&self, id: u64) -> Result<Option<MemoryEdge>, GraphError> {
        Ok(self.read()?.edges.get(&id).map(|record| MemoryEdge {
            graph: self.clone(),
            id,
            label: record.label.clone(),
        }))
    }

    /// Delete an edge. Returns whether it existed.
    pub fn remove_edge(&self, id: u64) -> Result<bool, GraphError> {
        let removed = self.write()?.edges.remove(&id).is_some();
        tracing::debug!(id, removed, "remove edge");
        Ok(removed)
    }

    /// Endpoints of an edge as `(outbound, inbound)` vertex ids.
    pub fn endpoints(&self, id: u64) -> Result<(u64, u64), GraphError> {
        self.read()?
            .edges
            .get(&id)
            .map(|record| (record.outbound, record.inbound))
            .ok_or(GraphError::EdgeRemoved(id))
    }

    pub fn edge_count(&self) -> Result<usize, GraphError> {
        Ok(self.read()?.edges.len())
    }

    fn same_graph(&self, other: &MemoryGraph) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn with_edge<T>(
        &self,
        id: u64,
        f: impl FnOnce(&EdgeRecord) -> T,
    ) -> Result<T, GraphError> {
        let state = self.read()?;
        let record = state.edges.get(&id).ok_or(GraphError::EdgeRemoved(id))?;
        Ok(f(record))
    }

    fn with_edge_mut<T>(
        &self,
        id: u64,
        f: impl FnOnce(&mut EdgeRecord) -> T,
    ) -> Result<T, GraphError> {
        let mut state = self.write()?;
        let record = state
            .edges
            .get_mut(&id)
            .ok_or(GraphError::EdgeRemoved(id))?;
        Ok(f(record))
    }
}

/// Handle to one edge of a [`MemoryGraph`].
#[derive(Clone)]
pub struct MemoryEdge {
    graph: MemoryGraph,
    id: u64,
    label: String,
}

impl MemoryEdge {
    pub fn raw_id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for MemoryEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e[{}][{}]", self.id, self.label)
    }
}

impl PartialEq for MemoryEdge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.graph.same_graph(&other.graph)
    }
}

impl Eq for MemoryEdge {}

impl Hash for MemoryEdge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl EdgeHandle for MemoryEdge {
    type Error = GraphError;

    fn id(&self) -> Value {
        Value::from(self.id)
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn keys(&self) -> Result<Vec<String>, GraphError> {
        self.graph
            .with_edge(self.id, |record| record.properties.keys().cloned().collect())
    }

    fn property(&self, key: &str) -> Result<Option<Value>, GraphError> {
        self.graph
            .with_edge(self.id, |record| record.properties.get(key).cloned())
    }

    fn set_property(&self, key: &str, value: Value) -> Result<(), GraphError> {
        self.graph.with_edge_mut(self.id, |record| {
            record.properties.insert(key.to_string(), value);
        })
    }

    fn remove_property(&self, key: &str) -> Result<(), GraphError> {
        self.graph.with_edge_mut(self.id, |record| {
            record.properties.remove(key);
        })
    }
}
