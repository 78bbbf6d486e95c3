//! Tracker client
//!
//! `HuckleberryClient` turns tracking actions (start a sleep, log a bottle,
//! ...) into document writes, and reads records back in local form.
//!
//! ## Data flow
//!
//! ```text
//!  caller ──local names──▶ HuckleberryClient ──to_remote──▶ DocumentStore
//!  caller ◀─local names─── HuckleberryClient ◀──to_local─── DocumentStore
//! ```
//!
//! Every read and write picks its mapping table from the [`Tracker`] it
//! touches, so feed timers are always labelled in seconds and sleep timers
//! in milliseconds.

mod feed;
mod log;
mod sleep;

pub use log::{BottleEntry, DiaperEntry, GrowthEntry};

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::document::{Document, DocumentPath};
use crate::error::{Error, Result};
use crate::mapping::{FieldTable, document_to_local, document_to_remote, to_remote};
use crate::paths::{self, Tracker};
use crate::records::{
    ChildData, DiaperData, DiaperDocumentData, FeedDocumentData, FeedIntervalData, GrowthData,
    HealthDocumentData, SleepDocumentData, SleepIntervalData, UserData, from_document,
};
use crate::traits::{DocumentStore, FilterOp, Query, SortDirection};

/// Range and size limits for entry history queries
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntryQuery {
    /// Only entries starting at or after this time
    pub since_sec: Option<f64>,
    /// Only entries starting before this time
    pub until_sec: Option<f64>,
    /// Maximum number of entries, newest first
    pub limit: Option<usize>,
}

impl EntryQuery {
    /// The newest `limit` entries
    pub fn latest(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// An entry document in local form
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Document id (`{unix_ms}-{20 hex}`)
    pub id: String,
    /// Body with local field names
    pub data: Document,
}

/// Client for reading and writing tracking records
///
/// # Example
///
/// ```rust,no_run
/// use huckleberry_core::{HuckleberryClient, MemoryDocumentStore};
/// use huckleberry_core::records::FeedSide;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> huckleberry_core::Result<()> {
///     let client = HuckleberryClient::new(Arc::new(MemoryDocumentStore::new()));
///
///     client.start_feeding("child-1", FeedSide::Left).await?;
///     client.switch_feeding_side("child-1").await?;
///     let interval = client.complete_feeding("child-1").await?;
///     println!("fed for {:?}s on the left", interval.left_duration_sec);
///     Ok(())
/// }
/// ```
pub struct HuckleberryClient {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    config: ClientConfig,
}

impl std::fmt::Debug for HuckleberryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuckleberryClient")
            .field("store", &self.store.store_name())
            .field("config", &self.config)
            .finish()
    }
}

impl HuckleberryClient {
    /// Create a client with default settings and the system clock
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, ClientConfig::default())
    }

    /// Create a client with explicit settings
    pub fn with_config(store: Arc<dyn DocumentStore>, config: ClientConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Active settings
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> f64 {
        self.clock.now_sec()
    }

    pub(crate) fn offset_min(&self) -> i32 {
        self.config.offset_min.unwrap_or_else(|| self.clock.offset_min())
    }

    /// Read a document and convert it to local names
    pub(crate) async fn read_local(
        &self,
        path: &DocumentPath,
        table: &FieldTable,
    ) -> Result<Option<Document>> {
        debug!(path = %path, store = self.store.store_name(), "reading document");
        let doc = self.store.get(path).await?;
        Ok(doc.map(|doc| document_to_local(&doc, table)))
    }

    /// Merge local-named field paths into a document
    pub(crate) async fn merge_local(
        &self,
        path: &DocumentPath,
        fields: Value,
        table: &FieldTable,
    ) -> Result<()> {
        let fields = into_document(fields)?;
        let remote = remote_field_paths(&fields, table);
        debug!(path = %path, fields = remote.len(), "merging document fields");
        self.store.merge(path, remote).await
    }

    /// Write a new entry document and return its id
    pub(crate) async fn create_entry(
        &self,
        tracker: Tracker,
        child_id: &str,
        entry: &Document,
    ) -> Result<String> {
        let id = entry_id(self.now());
        let path = tracker.entries(child_id).doc(&id);
        let table = tracker.table_kind().table();

        self.store.set(&path, document_to_remote(entry, table)).await?;
        info!(tracker = %tracker, child_id, entry_id = %id, "entry created");
        Ok(id)
    }

    /// Read a child profile
    pub async fn get_child(&self, child_id: &str) -> Result<Option<ChildData>> {
        let doc = self.read_local(&paths::child(child_id), FieldTable::standard()).await?;
        let Some(doc) = doc else {
            return Ok(None);
        };

        let mut child: ChildData = from_document(doc)?;
        if child.uid.is_empty() {
            child.uid = child_id.to_string();
        }
        Ok(Some(child))
    }

    /// Read every child listed in a user's profile
    ///
    /// Children listed but missing from the database are skipped.
    pub async fn get_children(&self, user_id: &str) -> Result<Vec<ChildData>> {
        let doc = self
            .read_local(&paths::user(user_id), FieldTable::standard())
            .await?
            .ok_or_else(|| Error::not_found(format!("user profile {}", user_id)))?;
        let user: UserData = from_document(doc)?;

        let mut children = Vec::with_capacity(user.child_list.len());
        for child_ref in &user.child_list {
            match self.get_child(&child_ref.cid).await? {
                Some(child) => children.push(child),
                None => warn!(child_id = %child_ref.cid, user_id, "listed child has no profile"),
            }
        }
        Ok(children)
    }

    /// Read `sleep/{child_id}`
    pub async fn sleep_document(&self, child_id: &str) -> Result<SleepDocumentData> {
        self.tracker_document(Tracker::Sleep, child_id).await
    }

    /// Read `feed/{child_id}`
    pub async fn feed_document(&self, child_id: &str) -> Result<FeedDocumentData> {
        self.tracker_document(Tracker::Feed, child_id).await
    }

    /// Read `diaper/{child_id}`
    pub async fn diaper_document(&self, child_id: &str) -> Result<DiaperDocumentData> {
        self.tracker_document(Tracker::Diaper, child_id).await
    }

    /// Read `health/{child_id}`
    pub async fn health_document(&self, child_id: &str) -> Result<HealthDocumentData> {
        self.tracker_document(Tracker::Health, child_id).await
    }

    /// Missing tracker documents read as empty
    async fn tracker_document<T: DeserializeOwned + Default>(
        &self,
        tracker: Tracker,
        child_id: &str,
    ) -> Result<T> {
        let table = tracker.table_kind().table();
        match self.read_local(&tracker.document(child_id), table).await? {
            Some(doc) => from_document(doc),
            None => Ok(T::default()),
        }
    }

    /// List entries of a tracker, newest first, in local form
    pub async fn list_entries(
        &self,
        tracker: Tracker,
        child_id: &str,
        query: EntryQuery,
    ) -> Result<Vec<Entry>> {
        self.query_entries(tracker, child_id, query, None).await
    }

    /// Entries ordered by start, newest first
    ///
    /// `mode` is matched here; an equality filter combined with the `start`
    /// ordering needs a composite index the app's database does not have.
    async fn query_entries(
        &self,
        tracker: Tracker,
        child_id: &str,
        query: EntryQuery,
        mode: Option<&str>,
    ) -> Result<Vec<Entry>> {
        let table = tracker.table_kind().table();
        let start_field = table.remote_name("start_sec").to_string();

        let mut remote_query = Query::new().order_by(start_field.clone(), SortDirection::Descending);
        if let Some(since) = query.since_sec {
            remote_query = remote_query.filter(start_field.clone(), FilterOp::GreaterThanOrEqual, since);
        }
        if let Some(until) = query.until_sec {
            remote_query = remote_query.filter(start_field.clone(), FilterOp::LessThan, until);
        }
        if let (Some(limit), None) = (query.limit, mode) {
            remote_query = remote_query.limit(limit);
        }

        let collection = tracker.entries(child_id);
        debug!(collection = %collection, ?query, mode, "querying entries");
        let stored = self.store.query(&collection, &remote_query).await?;

        let entries = stored
            .into_iter()
            .filter(|stored| {
                mode.is_none_or(|mode| stored.data.get("mode").and_then(Value::as_str) == Some(mode))
            })
            .map(|stored| Entry {
                id: stored.id().to_string(),
                data: document_to_local(&stored.data, table),
            });

        Ok(match query.limit {
            Some(limit) => entries.take(limit).collect(),
            None => entries.collect(),
        })
    }

    async fn typed_entries<T: DeserializeOwned>(
        &self,
        tracker: Tracker,
        child_id: &str,
        query: EntryQuery,
        mode: Option<&str>,
    ) -> Result<Vec<T>> {
        self.query_entries(tracker, child_id, query, mode)
            .await?
            .into_iter()
            .map(|entry| from_document(entry.data))
            .collect()
    }

    /// Completed sleeps, newest first
    pub async fn sleep_intervals(
        &self,
        child_id: &str,
        query: EntryQuery,
    ) -> Result<Vec<SleepIntervalData>> {
        self.typed_entries(Tracker::Sleep, child_id, query, None).await
    }

    /// Nursing and bottle entries, newest first
    pub async fn feed_intervals(
        &self,
        child_id: &str,
        query: EntryQuery,
    ) -> Result<Vec<FeedIntervalData>> {
        self.typed_entries(Tracker::Feed, child_id, query, None).await
    }

    /// Diaper changes, newest first
    pub async fn diaper_changes(&self, child_id: &str, query: EntryQuery) -> Result<Vec<DiaperData>> {
        self.typed_entries(Tracker::Diaper, child_id, query, None).await
    }

    /// Growth measurements, newest first
    pub async fn growth_entries(&self, child_id: &str, query: EntryQuery) -> Result<Vec<GrowthData>> {
        self.typed_entries(Tracker::Health, child_id, query, Some("growth"))
            .await
    }
}

/// Translate local field paths (`timer.timer_start_time_ms`) and their values
fn remote_field_paths(fields: &Document, table: &FieldTable) -> Document {
    fields
        .iter()
        .map(|(field_path, value)| {
            let remote_path = field_path
                .split('.')
                .map(|segment| table.remote_name(segment))
                .collect::<Vec<_>>()
                .join(".");
            (remote_path, to_remote(value, table))
        })
        .collect()
}

pub(crate) fn into_document(value: Value) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::invalid_input(format!(
            "expected a document, got {}",
            other
        ))),
    }
}

/// `{"seconds": now}` timestamp map stored on timers
pub(crate) fn server_timestamp(now_sec: f64) -> Value {
    json!({ "seconds": now_sec })
}

/// Entry document id: `{unix_ms}-{20 lowercase hex chars}`
pub(crate) fn entry_id(now_sec: f64) -> String {
    let millis = (now_sec * 1000.0).round() as i64;
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", millis, &random[..20])
}

/// Timer uuid: 16 lowercase hex chars
pub(crate) fn timer_uuid() -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    random[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_format() {
        let id = entry_id(1_764_528_069.548);
        let (millis, random) = id.split_once('-').unwrap();
        assert_eq!(millis, "1764528069548");
        assert_eq!(random.len(), 20);
        assert!(random.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_timer_uuid_format() {
        let uuid = timer_uuid();
        assert_eq!(uuid.len(), 16);
        assert!(uuid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_remote_field_paths_translate_every_segment() {
        let fields = into_document(json!({
            "timer.timer_start_time_sec": 10.0,
            "prefs.lastNursing": {"start_sec": 5.0},
        }))
        .unwrap();

        let remote = remote_field_paths(&fields, FieldTable::feed());
        assert_eq!(
            Value::Object(remote),
            json!({
                "timer.timerStartTime": 10.0,
                "prefs.lastNursing": {"start": 5.0},
            })
        );
    }

    #[test]
    fn test_into_document_rejects_scalars() {
        assert!(into_document(json!(1)).is_err());
    }
}
