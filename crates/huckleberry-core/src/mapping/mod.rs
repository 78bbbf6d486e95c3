//! Field mapping between database and client naming conventions
//!
//! The database stores camelCase keys with implicit units (`start`,
//! `timerStartTime`); the client exposes snake_case keys that carry their
//! unit (`start_sec`, `timer_start_time_ms`).
//!
//! - [`FieldTable`]: the remote ↔ local name tables
//! - [`to_local`] / [`to_remote`]: the recursive converter
//!
//! ```rust
//! use huckleberry_core::mapping::{to_local, TimerKind};
//! use serde_json::json;
//!
//! let remote = json!({"timerStartTime": 1000});
//! assert_eq!(
//!     to_local(&remote, TimerKind::Sleep.table()),
//!     json!({"timer_start_time_ms": 1000})
//! );
//! assert_eq!(
//!     to_local(&remote, TimerKind::Feed.table()),
//!     json!({"timer_start_time_sec": 1000})
//! );
//! ```

pub mod convert;
pub mod table;

pub use convert::{Direction, convert, document_to_local, document_to_remote, to_local, to_remote};
pub use table::{BASE_FIELDS, FEED_OVERRIDES, FieldTable, TableKind, TimerKind};
