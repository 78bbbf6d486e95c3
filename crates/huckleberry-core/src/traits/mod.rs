//! Core traits for the Huckleberry client
//!
//! This module defines the abstract interfaces that store implementations follow.
//!
//! - [`DocumentStore`]: Read and write remote documents
//! - [`StoreFactory`]: Build a store from configuration

pub mod document_store;

pub use document_store::{
    DocumentStore, FieldFilter, FilterOp, OrderBy, Query, SortDirection, StoreFactory,
    compare_values,
};
