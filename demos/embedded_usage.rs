//! Minimal embedding example for huckleberry-core
//!
//! This example plugs a custom document store into the registry and drives
//! a day of tracking through `HuckleberryClient` with a hand-moved clock.
//! Every write is printed in the remote naming the database sees, next to
//! the local naming the client returns.

use huckleberry_core::paths::Tracker;
use huckleberry_core::records::FeedSide;
use huckleberry_core::traits::Query;
use huckleberry_core::{
    BottleEntry, ClientConfig, CollectionPath, Document, DocumentPath, DocumentStore,
    EntryQuery, FixedClock, HuckleberryClient, MemoryDocumentStore, Result, StoreConfig,
    StoreFactory, StoredDocument, StoreRegistry,
};
use std::sync::Arc;

/// Store that prints every write before handing it to memory
struct JournalStore {
    label: String,
    inner: MemoryDocumentStore,
}

#[async_trait::async_trait]
impl DocumentStore for JournalStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocumentPath, doc: Document) -> Result<()> {
        println!("[{}] set   {} {}", self.label, path, serde_json::Value::Object(doc.clone()));
        self.inner.set(path, doc).await
    }

    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<()> {
        println!("[{}] merge {} {:?}", self.label, path, fields.keys().collect::<Vec<_>>());
        self.inner.merge(path, fields).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        self.inner.delete(path).await
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> Result<Vec<StoredDocument>> {
        self.inner.query(collection, query).await
    }

    fn store_name(&self) -> &'static str {
        "journal"
    }
}

struct JournalFactory;

impl StoreFactory for JournalFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn DocumentStore>> {
        let label = match config {
            StoreConfig::Custom { config, .. } => config
                .get("label")
                .and_then(|v| v.as_str())
                .unwrap_or("journal")
                .to_string(),
            _ => "journal".to_string(),
        };
        Ok(Box::new(JournalStore {
            label,
            inner: MemoryDocumentStore::new(),
        }))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    println!("=== Embedded huckleberry-core Example ===\n");

    // Register the custom store next to the built-in ones
    let registry = StoreRegistry::with_builtin();
    registry.register_store("journal", Box::new(JournalFactory));

    let config = StoreConfig::Custom {
        factory: "journal".to_string(),
        config: serde_json::json!({ "label": "demo" }),
    };
    let store: Arc<dyn DocumentStore> = Arc::from(registry.create_store(&config)?);

    let clock = Arc::new(FixedClock::new(1_764_528_000.0, -300));
    let client = HuckleberryClient::with_config(store, ClientConfig::default())
        .with_clock(clock.clone());
    let child = "child-1";

    println!("1. Nap with a ten minute interruption");
    client.start_sleep(child).await?;
    clock.advance(1800.0);
    client.pause_sleep(child).await?;
    clock.advance(600.0);
    client.resume_sleep(child).await?;
    clock.advance(1200.0);
    let nap = client.complete_sleep(child).await?;
    println!("   slept {}s\n", nap.duration_sec);

    println!("2. Nursing on both sides");
    clock.advance(3600.0);
    client.start_feeding(child, FeedSide::Left).await?;
    clock.advance(300.0);
    client.switch_feeding_side(child).await?;
    clock.advance(240.0);
    let feed = client.complete_feeding(child).await?;
    println!(
        "   left {:?}s, right {:?}s\n",
        feed.left_duration_sec, feed.right_duration_sec
    );

    println!("3. Bottle top-up");
    clock.advance(900.0);
    client.log_bottle_feeding(child, BottleEntry::new(60.0)).await?;

    println!("\n4. Feed history (local names)");
    for entry in client
        .list_entries(Tracker::Feed, child, EntryQuery::latest(5))
        .await?
    {
        println!("   {} {}", entry.id, serde_json::Value::Object(entry.data));
    }

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Custom stores register with the same registry as built-in ones");
    println!("- The store only ever sees remote field names");
    println!("- Time is injected, so sessions replay deterministically");

    Ok(())
}
