//! # nosqlmap-core
//!
//! Shared vocabulary for the nosqlmap adapters.
//!
//! This crate provides:
//! - `Value`, the tagged union every backend value is carried in
//! - `Element`, one key/value entry of a property bag
//! - `MappingError` and the argument guards adapters run before touching a
//!   driver
//! - `MappingConfig` (TOML) and tracing setup
//!
//! It does not talk to any backend. Graph and document adapters live in
//! `nosqlmap-graph` and `nosqlmap-document`.

pub mod config;
pub mod element;
pub mod error;
pub mod logging;
pub mod value;

pub use config::{ConfigError, DeliveryMode, DocumentConfig, LogFormat, LoggingConfig, MappingConfig};
pub use element::Element;
pub use error::{BoxError, MappingError, require_key, require_text, require_value};
pub use logging::init_logging;
pub use value::Value;

/// An application type stored as a record in a named collection.
pub trait Entity {
    /// Collection (document store) or label (graph store) the entity maps to.
    const COLLECTION: &'static str;
}
