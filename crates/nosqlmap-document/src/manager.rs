//! Async document-store driver contract.

use crate::document::DocumentEntity;
use nosqlmap_core::{BoxError, Value};

/// Single-use completion callback handed to a driver.
///
/// `FnOnce` makes double delivery impossible. Dropping the callback without
/// calling it is how a driver abandons a request.
pub type Callback<T> = Box<dyn FnOnce(Result<T, BoxError>) + Send + 'static>;

/// An asynchronous document collection manager.
///
/// The driver owns scheduling: it decides when and on which thread each
/// callback fires. Requests return immediately.
pub trait DocumentCollectionManagerAsync: Send + Sync {
    /// Store a document; the callback receives the stored form.
    fn insert(&self, entity: DocumentEntity, callback: Callback<DocumentEntity>);

    /// Delete documents matching `query`; the callback receives the count.
    fn delete(&self, query: &str, params: &[Value], callback: Callback<usize>);

    /// Find documents matching `query`, delivered in one batch.
    fn find(&self, query: &str, params: &[Value], callback: Callback<Vec<DocumentEntity>>);
}
