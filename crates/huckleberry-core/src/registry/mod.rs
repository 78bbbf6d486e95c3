//! Plugin-based store registry
//!
//! The registry allows document stores to be registered dynamically at
//! runtime, so the binary picks a store from configuration without
//! hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use huckleberry_core::registry::StoreRegistry;
//! use huckleberry_core::config::StoreConfig;
//!
//! let registry = StoreRegistry::with_builtin();
//! huckleberry_firestore::register(&registry);
//!
//! let store = registry.create_store(&config.store)?;
//! ```

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::store::MemoryStoreFactory;
use crate::traits::{DocumentStore, StoreFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Store registry for plugin-based document store creation
///
/// The registry maintains a map of store type names to factory objects,
/// allowing dynamic instantiation of stores based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct StoreRegistry {
    /// Registered document store factories
    stores: RwLock<HashMap<String, Box<dyn StoreFactory>>>,
}

impl StoreRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the stores shipped in this crate (`memory`)
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryStoreFactory));
        registry
    }

    /// Register a document store factory
    ///
    /// # Parameters
    ///
    /// - `name`: Store type name (e.g., "firestore", "memory")
    /// - `factory`: Factory object for creating store instances
    ///
    /// Registering an existing name replaces the previous factory.
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn StoreFactory>) {
        let name = name.into();
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(name, factory);
    }

    /// Create a document store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DocumentStore>)`: Created store instance
    /// - `Err(Error)`: If the store type is not registered or creation fails
    pub fn create_store(&self, config: &StoreConfig) -> Result<Box<dyn DocumentStore>> {
        let store_type = config.type_name();
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);

        let factory = stores
            .get(store_type)
            .ok_or_else(|| Error::config(format!("Unknown store type: {}", store_type)))?;

        tracing::debug!(store_type, "creating document store");
        factory.create(config)
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.keys().cloned().collect()
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.contains_key(name)
    }
}
