// # Document Store Implementations
//
// This module provides implementations of the DocumentStore trait that live
// in the core crate. Remote stores ship in their own crates.

pub mod memory;

pub use memory::{MemoryDocumentStore, MemoryStoreFactory};
