//! In-memory async document driver.
//!
//! Collections are vectors of documents kept in insertion order. Accepted
//! queries:
//!
//! ```text
//! SELECT * FROM <collection>
//! SELECT * FROM <collection> WHERE <field> = ?
//! DELETE FROM <collection>
//! DELETE FROM <collection> WHERE <field> = ?
//! ```
//!
//! `?` binds `params[0]`. Results are computed when the request is made and
//! delivered according to the configured [`DeliveryMode`].

use crate::document::{Document, DocumentEntity};
use crate::manager::{Callback, DocumentCollectionManagerAsync};
use nosqlmap_core::{BoxError, DeliveryMode, DocumentConfig, Value};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, RwLock};
use tokio::runtime::Handle;

/// Field that identifies a stored document.
pub const ID_FIELD: &str = "_id";

/// Errors delivered by the in-memory driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryManagerError {
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    #[error("query expects a parameter for `?` but none was given")]
    MissingParameter,

    #[error("cannot insert into an unnamed collection")]
    UnnamedCollection,

    #[error("document store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Select,
    Delete,
}

#[derive(Debug, PartialEq)]
struct ParsedQuery {
    verb: Verb,
    collection: String,
    filter: Option<(String, Value)>,
}

impl ParsedQuery {
    fn matches(&self, document: &DocumentEntity) -> bool {
        match &self.filter {
            None => true,
            Some((field, expected)) => document
                .find(field)
                .is_some_and(|d| &d.value == expected),
        }
    }
}

fn query_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(select\s+\*|delete)\s+from\s+([A-Za-z_][A-Za-z0-9_]*)(?:\s+where\s+([A-Za-z_][A-Za-z0-9_]*)\s*=\s*\?)?\s*;?\s*$",
        )
        .expect("query regex must compile")
    })
}

fn parse_query(query: &str, params: &[Value]) -> Result<ParsedQuery, MemoryManagerError> {
    let captures = query_re()
        .captures(query)
        .ok_or_else(|| MemoryManagerError::UnsupportedQuery(query.to_string()))?;

    let verb = match captures.get(1) {
        Some(m) if m.as_str().to_ascii_lowercase().starts_with("select") => Verb::Select,
        _ => Verb::Delete,
    };
    let collection = captures
        .get(2)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| MemoryManagerError::UnsupportedQuery(query.to_string()))?;
    let filter = match captures.get(3) {
        Some(field) => {
            let value = params
                .first()
                .cloned()
                .ok_or(MemoryManagerError::MissingParameter)?;
            Some((field.as_str().to_string(), value))
        }
        None => None,
    };

    Ok(ParsedQuery {
        verb,
        collection,
        filter,
    })
}

/// Shared in-memory document store with async delivery.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentManager {
    collections: Arc<RwLock<BTreeMap<String, Vec<DocumentEntity>>>>,
    delivery: DeliveryMode,
}

impl MemoryDocumentManager {
    pub fn new(delivery: DeliveryMode) -> Self {
        Self {
            collections: Arc::default(),
            delivery,
        }
    }

    pub fn from_config(config: &DocumentConfig) -> Self {
        Self::new(config.delivery)
    }

    pub fn delivery(&self) -> DeliveryMode {
        self.delivery
    }

    /// Number of documents stored in `collection`.
    pub fn count(&self, collection: &str) -> Result<usize, MemoryManagerError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| MemoryManagerError::Poisoned)?;
        Ok(collections.get(collection).map_or(0, Vec::len))
    }

    fn store(&self, mut entity: DocumentEntity) -> Result<DocumentEntity, MemoryManagerError> {
        if entity.name().trim().is_empty() {
            return Err(MemoryManagerError::UnnamedCollection);
        }
        // A null `_id` is treated as absent.
        if entity.find(ID_FIELD).is_none_or(|d| d.value.is_null()) {
            entity.add(Document::new(ID_FIELD, uuid::Uuid::new_v4().to_string()));
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| MemoryManagerError::Poisoned)?;
        let stored = collections.entry(entity.name().to_string()).or_default();
        let id = entity.find(ID_FIELD).map(|d| d.value.clone());
        stored.retain(|existing| existing.find(ID_FIELD).map(|d| d.value.clone()) != id);
        stored.push(entity.clone());
        tracing::debug!(collection = entity.name(), total = stored.len(), "stored document");
        Ok(entity)
    }

    fn select(
        &self,
        query: &str,
        params: &[Value],
    ) -> Result<Vec<DocumentEntity>, MemoryManagerError> {
        let parsed = parse_query(query, params)?;
        if parsed.verb != Verb::Select {
            return Err(MemoryManagerError::UnsupportedQuery(query.to_string()));
        }
        let collections = self
            .collections
            .read()
            .map_err(|_| MemoryManagerError::Poisoned)?;
        let found: Vec<DocumentEntity> = collections
            .get(&parsed.collection)
            .into_iter()
            .flatten()
            .filter(|document| parsed.matches(document))
            .cloned()
            .collect();
        tracing::debug!(collection = %parsed.collection, found = found.len(), "selected documents");
        Ok(found)
    }

    fn remove(&self, query: &str, params: &[Value]) -> Result<usize, MemoryManagerError> {
        let parsed = parse_query(query, params)?;
        if parsed.verb != Verb::Delete {
            return Err(MemoryManagerError::UnsupportedQuery(query.to_string()));
        }
        let mut collections = self
            .collections
            .write()
            .map_err(|_| MemoryManagerError::Poisoned)?;
        let Some(stored) = collections.get_mut(&parsed.collection) else {
            return Ok(0);
        };
        let before = stored.len();
        stored.retain(|document| !parsed.matches(document));
        let removed = before - stored.len();
        tracing::debug!(collection = %parsed.collection, removed, "deleted documents");
        Ok(removed)
    }

    /// Fire `callback` according to the delivery mode.
    ///
    /// Spawned delivery outside a tokio runtime falls back to inline.
    fn deliver<T: Send + 'static>(
        &self,
        outcome: Result<T, MemoryManagerError>,
        callback: Callback<T>,
    ) {
        let outcome = outcome.map_err(|err| Box::new(err) as BoxError);
        match (self.delivery, Handle::try_current()) {
            (DeliveryMode::Spawned, Ok(handle)) => {
                handle.spawn(async move { callback(outcome) });
            }
            (DeliveryMode::Spawned, Err(_)) => {
                tracing::trace!("no runtime available, delivering inline");
                callback(outcome);
            }
            (DeliveryMode::Inline, _) => callback(outcome),
        }
    }
}

impl DocumentCollectionManagerAsync for MemoryDocumentManager {
    fn insert(&self, entity: DocumentEntity, callback: Callback<DocumentEntity>) {
        let outcome = self.store(entity);
        self.deliver(outcome, callback);
    }

    fn delete(&self, query: &str, params: &[Value], callback: Callback<usize>) {
        let outcome = self.remove(query, params);
        self.deliver(outcome, callback);
    }

    fn find(&self, query: &str, params: &[Value], callback: Callback<Vec<DocumentEntity>>) {
        let outcome = self.select(query, params);
        self.deliver(outcome, callback);
    }
}
