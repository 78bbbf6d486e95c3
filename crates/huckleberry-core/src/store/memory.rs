// # Memory Document Store
//
// In-memory implementation of DocumentStore.
//
// ## Purpose
//
// Mirrors the document database's read/write/query semantics without any
// network access. Used by the test suites and by the `memory` store type,
// which lets the CLI be exercised without credentials.
//
// ## Behavior
//
// - All data is lost when the store is dropped
// - `merge` applies dot-separated field paths like the remote store
// - Queries only see direct children of the collection; documents missing
//   the order-by field are excluded, as the remote store does

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::StoreConfig;
use crate::document::{CollectionPath, Document, DocumentPath, StoredDocument, get_field, merge_fields};
use crate::traits::document_store::{
    DocumentStore, Query, SortDirection, StoreFactory, compare_values,
};
use crate::{Error, Result};

/// In-memory document store implementation
///
/// This implementation stores all documents in a HashMap protected by a RwLock.
/// Clones share the same underlying data.
///
/// # Example
///
/// ```rust,no_run
/// use huckleberry_core::store::MemoryDocumentStore;
/// use huckleberry_core::traits::DocumentStore;
/// use huckleberry_core::paths::Tracker;
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryDocumentStore::new();
///     let path = Tracker::Sleep.document("child-1");
///
///     let fields = json!({"timer.active": true}).as_object().cloned().unwrap();
///     store.merge(&path, fields).await?;
///
///     let doc = store.get(&path).await?.unwrap();
///     assert_eq!(doc["timer"]["active"], json!(true));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<RwLock<HashMap<DocumentPath, Document>>>,
}

impl MemoryDocumentStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of documents in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Clear all documents from the store
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    /// All document paths, sorted
    pub async fn paths(&self) -> Vec<DocumentPath> {
        let mut paths: Vec<DocumentPath> = self.inner.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }
}

fn sort_key_order(a: &Document, b: &Document, field: &str) -> Ordering {
    match (get_field(a, field), get_field(b, field)) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        let guard = self.inner.read().await;
        Ok(guard.get(path).cloned())
    }

    async fn set(&self, path: &DocumentPath, doc: Document) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard.insert(path.clone(), doc);
        Ok(())
    }

    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<()> {
        if let Some(bad) = fields
            .keys()
            .find(|field_path| field_path.split('.').any(str::is_empty))
        {
            return Err(Error::store(format!(
                "invalid field path '{}' in merge of {}",
                bad, path
            )));
        }

        let mut guard = self.inner.write().await;
        let doc = guard.entry(path.clone()).or_default();
        merge_fields(doc, &fields);
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard.remove(path);
        Ok(())
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<StoredDocument>> {
        let guard = self.inner.read().await;

        let mut matches: Vec<StoredDocument> = guard
            .iter()
            .filter(|(path, _)| &path.parent() == collection)
            .filter(|(_, doc)| query.filters.iter().all(|filter| filter.matches(doc)))
            .map(|(path, doc)| StoredDocument {
                path: path.clone(),
                data: doc.clone(),
            })
            .collect();

        // Stable base order so equal sort keys come back deterministically
        matches.sort_by(|a, b| a.path.cmp(&b.path));

        if let Some(order) = &query.order_by {
            matches.retain(|stored| get_field(&stored.data, &order.field).is_some());
            matches.sort_by(|a, b| {
                let ordering = sort_key_order(&a.data, &b.data, &order.field);
                match order.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }

        Ok(matches)
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for the `memory` store type
pub struct MemoryStoreFactory;

impl StoreFactory for MemoryStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn DocumentStore>> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemoryDocumentStore::new())),
            _ => Err(Error::config("Invalid config for memory store")),
        }
    }
}
