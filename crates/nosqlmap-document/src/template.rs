//! Typed async template over a document driver.
//!
//! `DocumentTemplateAsync` composes a driver (`M`) with a converter (`C`).
//! It checks arguments, hands the request to the driver, and converts whatever
//! the driver delivers into entities. It never blocks and never spawns.

use crate::converter::{ConversionError, DocumentEntityConverter};
use crate::document::DocumentEntity;
use crate::manager::DocumentCollectionManagerAsync;
use nosqlmap_core::{BoxError, MappingError, Value, require_text};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Errors surfaced by template operations.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Rejected before the driver was called.
    #[error(transparent)]
    Argument(#[from] MappingError),

    /// Failure delivered by the driver, unchanged.
    #[error(transparent)]
    Backend(BoxError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The driver dropped the request without delivering a result.
    #[error("driver abandoned the request without a result")]
    Abandoned,
}

/// Result of a template request, resolved when the driver delivers.
///
/// Dropping it cancels interest; the driver still runs the request.
#[derive(Debug)]
pub struct PendingResult<T> {
    rx: oneshot::Receiver<Result<T, TemplateError>>,
}

impl<T> Future for PendingResult<T> {
    type Output = Result<T, TemplateError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(TemplateError::Abandoned)))
    }
}

/// Run `request` with a callback feeding a fresh [`PendingResult`].
fn pending<T, R>(request: R) -> Result<PendingResult<T>, TemplateError>
where
    R: FnOnce(Box<dyn FnOnce(Result<T, TemplateError>) + Send>) -> Result<(), TemplateError>,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel::<Result<T, TemplateError>>();
    request(Box::new(move |outcome: Result<T, TemplateError>| {
        // A dropped receiver means the caller stopped waiting.
        let _ = tx.send(outcome);
    }))?;
    Ok(PendingResult { rx })
}

fn convert_all<T, C>(converter: &C, documents: Vec<DocumentEntity>) -> Result<Vec<T>, TemplateError>
where
    C: DocumentEntityConverter<T>,
{
    documents
        .into_iter()
        .map(|document| converter.to_entity(document))
        .collect::<Result<Vec<T>, _>>()
        .map_err(|err| {
            tracing::warn!(error = %err, "document conversion failed");
            TemplateError::Conversion(err)
        })
}

/// Async template bound to one driver and one converter.
#[derive(Debug)]
pub struct DocumentTemplateAsync<M, C> {
    manager: Arc<M>,
    converter: Arc<C>,
}

impl<M, C> Clone for DocumentTemplateAsync<M, C> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            converter: Arc::clone(&self.converter),
        }
    }
}

impl<M, C> DocumentTemplateAsync<M, C>
where
    M: DocumentCollectionManagerAsync,
    C: Send + Sync + 'static,
{
    pub fn new(manager: Arc<M>, converter: C) -> Self {
        Self {
            manager,
            converter: Arc::new(converter),
        }
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Find entities matching `query`.
    ///
    /// A blank query fails here, before the driver sees it. Otherwise query
    /// and params pass through unchanged and `callback` fires once, on the
    /// driver's thread, with every document converted in delivery order. One
    /// failed conversion fails the whole batch.
    pub fn find<T, F>(&self, query: &str, params: &[Value], callback: F) -> Result<(), TemplateError>
    where
        C: DocumentEntityConverter<T>,
        T: Send + 'static,
        F: FnOnce(Result<Vec<T>, TemplateError>) + Send + 'static,
    {
        require_text(query, "query")?;
        tracing::debug!(query, params = params.len(), "dispatching async find");

        let converter = Arc::clone(&self.converter);
        self.manager.find(
            query,
            params,
            Box::new(move |delivered: Result<Vec<DocumentEntity>, BoxError>| {
                let outcome = delivered
                    .map_err(TemplateError::Backend)
                    .and_then(|documents| {
                        tracing::trace!(count = documents.len(), "find delivered");
                        convert_all(converter.as_ref(), documents)
                    });
                callback(outcome);
            }),
        );
        Ok(())
    }

    /// [`find`](Self::find) as a future.
    pub fn find_async<T>(
        &self,
        query: &str,
        params: &[Value],
    ) -> Result<PendingResult<Vec<T>>, TemplateError>
    where
        C: DocumentEntityConverter<T>,
        T: Send + 'static,
    {
        pending(|deliver| self.find(query, params, deliver))
    }

    /// Store `entity`; `callback` receives the entity as the driver stored it.
    pub fn insert<T, F>(&self, entity: &T, callback: F) -> Result<(), TemplateError>
    where
        C: DocumentEntityConverter<T>,
        T: Send + 'static,
        F: FnOnce(Result<T, TemplateError>) + Send + 'static,
    {
        let document = self.converter.to_document(entity)?;
        tracing::debug!(collection = document.name(), "dispatching async insert");

        let converter = Arc::clone(&self.converter);
        self.manager.insert(
            document,
            Box::new(move |delivered: Result<DocumentEntity, BoxError>| {
                let outcome = delivered
                    .map_err(TemplateError::Backend)
                    .and_then(|stored| {
                        converter.to_entity(stored).map_err(|err| {
                            tracing::warn!(error = %err, "document conversion failed");
                            TemplateError::Conversion(err)
                        })
                    });
                callback(outcome);
            }),
        );
        Ok(())
    }

    /// [`insert`](Self::insert) as a future.
    pub fn insert_async<T>(&self, entity: &T) -> Result<PendingResult<T>, TemplateError>
    where
        C: DocumentEntityConverter<T>,
        T: Send + 'static,
    {
        pending(|deliver| self.insert(entity, deliver))
    }

    /// Delete documents matching `query`; `callback` receives the count.
    pub fn delete<F>(&self, query: &str, params: &[Value], callback: F) -> Result<(), TemplateError>
    where
        F: FnOnce(Result<usize, TemplateError>) + Send + 'static,
    {
        require_text(query, "query")?;
        tracing::debug!(query, params = params.len(), "dispatching async delete");

        self.manager.delete(
            query,
            params,
            Box::new(move |delivered: Result<usize, BoxError>| {
                callback(delivered.map_err(TemplateError::Backend));
            }),
        );
        Ok(())
    }

    /// [`delete`](Self::delete) as a future.
    pub fn delete_async(
        &self,
        query: &str,
        params: &[Value],
    ) -> Result<PendingResult<usize>, TemplateError> {
        pending(|deliver| self.delete(query, params, deliver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::Callback;
    use std::sync::Mutex;

    /// Driver that parks callbacks so the test decides when they fire.
    #[derive(Default)]
    struct ParkedManager {
        finds: Mutex<Vec<(String, Vec<Value>, Callback<Vec<DocumentEntity>>)>>,
    }

    impl DocumentCollectionManagerAsync for ParkedManager {
        fn insert(&self, entity: DocumentEntity, callback: Callback<DocumentEntity>) {
            callback(Ok(entity));
        }

        fn delete(&self, _query: &str, _params: &[Value], callback: Callback<usize>) {
            drop(callback);
        }

        fn find(&self, query: &str, params: &[Value], callback: Callback<Vec<DocumentEntity>>) {
            self.finds
                .lock()
                .expect("lock")
                .push((query.to_string(), params.to_vec(), callback));
        }
    }

    /// Converter that reads the `n` field and fails on negatives.
    struct NumberConverter;

    impl DocumentEntityConverter<i64> for NumberConverter {
        fn to_document(&self, entity: &i64) -> Result<DocumentEntity, ConversionError> {
            Ok(DocumentEntity::new("Number").with("n", *entity))
        }

        fn to_entity(&self, document: DocumentEntity) -> Result<i64, ConversionError> {
            match document.find("n").and_then(|d| d.value.as_i64()) {
                Some(n) if n >= 0 => Ok(n),
                _ => Err(ConversionError::CollectionMismatch {
                    expected: "Number",
                    found: document.name().to_string(),
                }),
            }
        }
    }

    fn number(n: i64) -> DocumentEntity {
        DocumentEntity::new("Number").with("n", n)
    }

    #[test]
    fn query_and_params_pass_through_and_callback_waits_for_driver() {
        let manager = Arc::new(ParkedManager::default());
        let template = DocumentTemplateAsync::new(Arc::clone(&manager), NumberConverter);
        let seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        template
            .find("SELECT * FROM Number", &[Value::Int(1)], move |r: Result<Vec<i64>, _>| {
                *sink.lock().expect("lock") = Some(r.expect("conversion ok"));
            })
            .expect("dispatch");
        assert!(seen.lock().expect("lock").is_none());

        let (query, params, callback) = manager.finds.lock().expect("lock").remove(0);
        assert_eq!(query, "SELECT * FROM Number");
        assert_eq!(params, vec![Value::Int(1)]);

        callback(Ok(vec![number(3), number(1), number(2)]));
        assert_eq!(*seen.lock().expect("lock"), Some(vec![3, 1, 2]));
    }

    #[test]
    fn blank_query_never_reaches_driver() {
        let manager = Arc::new(ParkedManager::default());
        let template = DocumentTemplateAsync::new(Arc::clone(&manager), NumberConverter);

        let err = template
            .find("   ", &[], |_: Result<Vec<i64>, _>| {})
            .expect_err("blank query must fail");
        assert!(matches!(
            err,
            TemplateError::Argument(MappingError::NullArgument("query"))
        ));
        assert!(manager.finds.lock().expect("lock").is_empty());
    }

    #[test]
    fn one_bad_document_fails_the_batch() {
        let manager = Arc::new(ParkedManager::default());
        let template = DocumentTemplateAsync::new(Arc::clone(&manager), NumberConverter);
        let seen = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        template
            .find("SELECT * FROM Number", &[], move |r: Result<Vec<i64>, _>| {
                *sink.lock().expect("lock") = Some(r.is_err());
            })
            .expect("dispatch");
        let (_, _, callback) = manager.finds.lock().expect("lock").remove(0);
        callback(Ok(vec![number(1), number(-1), number(2)]));
        assert_eq!(*seen.lock().expect("lock"), Some(true));
    }

    #[tokio::test]
    async fn driver_errors_arrive_unchanged() {
        #[derive(Debug, thiserror::Error)]
        #[error("syntax error near FROM")]
        struct Syntax;

        let manager = Arc::new(ParkedManager::default());
        let template = DocumentTemplateAsync::new(Arc::clone(&manager), NumberConverter);
        let pending = template
            .find_async::<i64>("SELECT FROM", &[])
            .expect("dispatch");
        let (_, _, callback) = manager.finds.lock().expect("lock").remove(0);
        callback(Err(Box::new(Syntax) as BoxError));

        let err = pending.await.expect_err("driver error");
        assert!(matches!(err, TemplateError::Backend(_)));
        assert_eq!(err.to_string(), "syntax error near FROM");
    }

    #[tokio::test]
    async fn dropped_callback_resolves_as_abandoned() {
        let manager = Arc::new(ParkedManager::default());
        let template = DocumentTemplateAsync::new(manager, NumberConverter);
        let err = template
            .delete_async("DELETE FROM Number", &[])
            .expect("dispatch")
            .await
            .expect_err("driver dropped the callback");
        assert!(matches!(err, TemplateError::Abandoned));
    }

    #[tokio::test]
    async fn insert_converts_both_ways() {
        let manager = Arc::new(ParkedManager::default());
        let template = DocumentTemplateAsync::new(manager, NumberConverter);
        let stored = template
            .insert_async(&42_i64)
            .expect("dispatch")
            .await
            .expect("insert");
        assert_eq!(stored, 42);
    }
}
