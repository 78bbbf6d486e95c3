// # huckleberry-core
//
// Core library for reading and writing Huckleberry child-care tracking
// records.
//
// ## Architecture Overview
//
// The app's database labels fields in camelCase without units
// (`timerStartTime`, `start`, `offset`); this library exposes them with
// units in the name (`timer_start_time_ms`, `start_sec`, `offset_min`).
//
// - **mapping**: Field tables and the recursive name converter
// - **DocumentStore**: Trait for the document database (remote names only)
// - **HuckleberryClient**: Tracker operations in local names
// - **StoreRegistry**: Plugin-based registry for document stores
//
// ## Design Principles
//
// 1. **Naming at one seam**: Stores never see local names, callers never see
//    remote ones
// 2. **Typed table selection**: The mapping table follows from the tracker
// 3. **Plugin-Based**: Stores are registered dynamically, no hard-coded if-else
// 4. **Library-First**: The CLI is a thin shell over `HuckleberryClient`

pub mod client;
pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod mapping;
pub mod paths;
pub mod records;
pub mod registry;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use client::{BottleEntry, DiaperEntry, Entry, EntryQuery, GrowthEntry, HuckleberryClient};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ClientConfig, HuckleberryConfig, StoreConfig};
pub use document::{CollectionPath, Document, DocumentPath, StoredDocument};
pub use error::{Error, Result};
pub use mapping::{FieldTable, TableKind, TimerKind, to_local, to_remote};
pub use paths::Tracker;
pub use registry::StoreRegistry;
pub use store::MemoryDocumentStore;
pub use traits::{DocumentStore, StoreFactory};
