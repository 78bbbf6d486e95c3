// # Document Store Trait
//
// Defines the interface to the document database holding tracking records.
//
// ## Implementations
//
// - In-memory: `MemoryDocumentStore` (tests, offline demos)
// - Firestore REST: `huckleberry-firestore` crate
//
// ## Field names
//
// Stores only ever see **remote** field names. Translation to the local
// naming convention happens above this trait, in `HuckleberryClient`.
//
// ## Usage
//
// ```rust,ignore
// use huckleberry_core::DocumentStore;
// use huckleberry_core::paths::Tracker;
//
// let store = /* DocumentStore implementation */;
// let doc = store.get(&Tracker::Sleep.document("child-1")).await?;
// ```

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;

use crate::document::{CollectionPath, Document, DocumentPath, StoredDocument, get_field};

/// Comparison applied by a [`FieldFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

/// `field <op> value` condition on a query
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// Dot-separated remote field path
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    /// Evaluate the filter against a document
    ///
    /// Missing fields and values of incomparable types never match.
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = get_field(doc, &self.field) else {
            return false;
        };
        let Some(ordering) = compare_values(actual, &self.value) else {
            return false;
        };
        match self.op {
            FilterOp::Equal => ordering == Ordering::Equal,
            FilterOp::LessThan => ordering == Ordering::Less,
            FilterOp::LessThanOrEqual => ordering != Ordering::Greater,
            FilterOp::GreaterThan => ordering == Ordering::Greater,
            FilterOp::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }
}

/// Sort direction for [`OrderBy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort key of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Dot-separated remote field path
    pub field: String,
    pub direction: SortDirection,
}

/// Collection query: all filters must match, then sort, then limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    /// Create an unfiltered query
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Set the sort key
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Cap the number of results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Order two JSON values of the same kind
///
/// Numbers compare numerically (integers and doubles mix), strings and
/// booleans naturally. Anything else is incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Trait for document store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Responsibilities
///
/// - ✅ Read and write documents exactly as given (remote field names)
/// - ✅ Map transport failures to [`crate::Error`]
/// - ❌ Translate field names (owned by `HuckleberryClient`)
/// - ❌ Retry failed calls (callers decide via [`crate::Error::is_transient`])
/// - ❌ Cache documents between calls
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Document))`: The document body
    /// - `Ok(None)`: No document at this path
    /// - `Err(Error)`: Store error
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, crate::Error>;

    /// Create or overwrite a whole document
    async fn set(&self, path: &DocumentPath, doc: Document) -> Result<(), crate::Error>;

    /// Update individual fields, creating the document if missing
    ///
    /// Each key of `fields` is a dot-separated field path (`timer.paused`,
    /// `prefs.lastSleep`). The value replaces whatever is stored at that
    /// path; sibling fields are left alone.
    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<(), crate::Error>;

    /// Delete a document
    ///
    /// Deleting a missing document succeeds.
    async fn delete(&self, path: &DocumentPath) -> Result<(), crate::Error>;

    /// Run a query over the direct children of a collection
    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, crate::Error>;

    /// User id the store is authenticated as
    ///
    /// Stores without an account (in-memory, custom) return `Ok(None)`.
    async fn signed_in_user(&self) -> Result<Option<String>, crate::Error> {
        Ok(None)
    }

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}

/// Helper trait for constructing document stores from configuration
pub trait StoreFactory: Send + Sync {
    /// Create a DocumentStore instance from configuration
    fn create(
        &self,
        config: &crate::config::StoreConfig,
    ) -> Result<Box<dyn DocumentStore>, crate::Error>;
}
