//! Graph adapter.
//!
//! Presents a property-graph edge as a typed entity: the driver's edge handle
//! plus the two endpoint entities it connects. All durable state stays in the
//! driver; this crate only converts at the boundary.
//!
//! `MemoryGraph` is an in-process driver used by tests and demos.

pub mod edge;
pub mod memory;

pub use edge::{EdgeEntity, EdgeHandle};
pub use memory::{GraphError, MemoryEdge, MemoryGraph};
