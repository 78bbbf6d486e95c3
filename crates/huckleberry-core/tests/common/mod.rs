//! Test doubles and common utilities for contract tests
//!
//! This module provides a recording document store and helpers for building
//! clients with a pinned clock.

#![allow(dead_code)]

use huckleberry_core::document::{CollectionPath, Document, DocumentPath, StoredDocument};
use huckleberry_core::error::Result;
use huckleberry_core::traits::{DocumentStore, Query};
use huckleberry_core::{ClientConfig, FixedClock, HuckleberryClient, MemoryDocumentStore};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Fixed start time for client tests (2025-11-30T18:41:09Z)
pub const T0: f64 = 1_764_528_069.0;

/// Timezone offset used by client tests (UTC-5)
pub const OFFSET_MIN: i32 = -300;

pub const CHILD_ID: &str = "child-1";

/// A DocumentStore that records every call and delegates to memory
#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: MemoryDocumentStore,
    /// Call counter for get()
    get_call_count: Arc<AtomicUsize>,
    /// Call counter for set() and merge()
    write_call_count: Arc<AtomicUsize>,
    /// Call counter for query()
    query_call_count: Arc<AtomicUsize>,
    /// Field-path keys of every merge(), in call order
    merged_fields: Arc<Mutex<Vec<Vec<String>>>>,
    /// Every query(), in call order
    queries: Arc<Mutex<Vec<Query>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The memory store holding the data
    pub fn memory(&self) -> &MemoryDocumentStore {
        &self.inner
    }

    /// Get the number of times get() was called
    pub fn get_call_count(&self) -> usize {
        self.get_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times set() or merge() was called
    pub fn write_call_count(&self) -> usize {
        self.write_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times query() was called
    pub fn query_call_count(&self) -> usize {
        self.query_call_count.load(Ordering::SeqCst)
    }

    /// Field paths passed to each merge()
    pub fn merged_fields(&self) -> Vec<Vec<String>> {
        self.merged_fields.lock().unwrap().clone()
    }

    /// Queries passed to query()
    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    /// Raw stored document (remote names)
    pub async fn raw(&self, path: &DocumentPath) -> Option<Value> {
        self.inner.get(path).await.unwrap().map(Value::Object)
    }

    /// Raw stored documents of a collection (remote names), by id
    pub async fn raw_collection(&self, collection: &CollectionPath) -> Vec<StoredDocument> {
        self.inner.query(collection, &Query::new()).await.unwrap()
    }
}

#[async_trait::async_trait]
impl DocumentStore for RecordingStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        self.get_call_count.fetch_add(1, Ordering::SeqCst);
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocumentPath, doc: Document) -> Result<()> {
        self.write_call_count.fetch_add(1, Ordering::SeqCst);
        self.inner.set(path, doc).await
    }

    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<()> {
        self.write_call_count.fetch_add(1, Ordering::SeqCst);
        self.merged_fields
            .lock()
            .unwrap()
            .push(fields.keys().cloned().collect());
        self.inner.merge(path, fields).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        self.inner.delete(path).await
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<StoredDocument>> {
        self.query_call_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        self.inner.query(collection, query).await
    }

    fn store_name(&self) -> &'static str {
        "recording"
    }
}

/// Client over a fresh recording store with a clock pinned at [`T0`]
pub fn test_client() -> (HuckleberryClient, RecordingStore, Arc<FixedClock>) {
    test_client_with(ClientConfig::default())
}

/// Like [`test_client`] with explicit settings
pub fn test_client_with(
    config: ClientConfig,
) -> (HuckleberryClient, RecordingStore, Arc<FixedClock>) {
    let store = RecordingStore::new();
    let clock = Arc::new(FixedClock::new(T0, OFFSET_MIN));
    let client = HuckleberryClient::with_config(Arc::new(store.clone()), config)
        .with_clock(clock.clone());
    (client, store, clock)
}

/// Convert a JSON literal into a Document
pub fn doc(value: Value) -> Document {
    value.as_object().cloned().expect("test document must be an object")
}

/// Log output captured by [`capture_warnings`]
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Every captured line
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Captured WARN lines
    pub fn warnings(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains("WARN"))
            .collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` under a thread-local subscriber that records WARN and above
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .without_time()
        .with_writer(move || writer.clone())
        .finish();

    let output = tracing::subscriber::with_default(subscriber, f);
    (output, logs)
}
