//! # nosqlmap-document
//!
//! Document adapter: typed entities over asynchronous document-store drivers.
//!
//! This crate provides:
//! - `Document` / `DocumentEntity` (the backend-native record)
//! - `DocumentEntityConverter` and the serde-backed `SerdeConverter`
//! - `DocumentCollectionManagerAsync`, the driver contract
//! - `DocumentTemplateAsync`, which composes a driver and a converter
//! - `MemoryDocumentManager`, an in-process driver
//!
//! ## Request flow
//!
//! ```text
//! template.find(query, params, callback)
//!     -> driver.find(query, params, adapter)      (driver schedules)
//!     -> adapter(Vec<DocumentEntity>)             (driver's thread)
//!     -> callback(Vec<T>)                         (converted, same order)
//! ```

pub mod converter;
pub mod document;
pub mod manager;
pub mod memory;
pub mod template;

pub use converter::{ConversionError, DocumentEntityConverter, SerdeConverter};
pub use document::{Document, DocumentEntity};
pub use manager::{Callback, DocumentCollectionManagerAsync};
pub use memory::{ID_FIELD, MemoryDocumentManager, MemoryManagerError};
pub use template::{DocumentTemplateAsync, PendingResult, TemplateError};
