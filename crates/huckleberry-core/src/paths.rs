//! Collection layout of the tracking database
//!
//! ```text
//! users/{uid}                         profile with `childList`
//! childs/{child_id}                   child profile
//! sleep/{child_id}                    timer + prefs
//! sleep/{child_id}/intervals/{id}     completed sleeps
//! feed/{child_id}                     timer + prefs
//! feed/{child_id}/intervals/{id}      nursing and bottle entries
//! diaper/{child_id}                   prefs
//! diaper/{child_id}/intervals/{id}    diaper changes
//! health/{child_id}                   prefs
//! health/{child_id}/data/{id}         growth measurements
//! ```
//!
//! Health is the only tracker whose entries live under `data`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document::{CollectionPath, DocumentPath};
use crate::error::Error;
use crate::mapping::{TableKind, TimerKind};

/// Collection holding user profiles
pub const USERS_COLLECTION: &str = "users";

/// Collection holding child profiles
pub const CHILDREN_COLLECTION: &str = "childs";

/// A record type with its own top-level collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tracker {
    Sleep,
    Feed,
    Diaper,
    Health,
}

impl Tracker {
    /// All trackers
    pub const ALL: [Tracker; 4] = [Tracker::Sleep, Tracker::Feed, Tracker::Diaper, Tracker::Health];

    /// Top-level collection name
    pub fn collection(self) -> &'static str {
        match self {
            Tracker::Sleep => "sleep",
            Tracker::Feed => "feed",
            Tracker::Diaper => "diaper",
            Tracker::Health => "health",
        }
    }

    /// Sub-collection holding completed entries
    pub fn entries_collection(self) -> &'static str {
        match self {
            Tracker::Health => "data",
            Tracker::Sleep | Tracker::Feed | Tracker::Diaper => "intervals",
        }
    }

    /// Timer kind, for trackers that have a resumable timer
    pub fn timer_kind(self) -> Option<TimerKind> {
        match self {
            Tracker::Sleep => Some(TimerKind::Sleep),
            Tracker::Feed => Some(TimerKind::Feed),
            Tracker::Diaper | Tracker::Health => None,
        }
    }

    /// Mapping table for this tracker's documents
    pub fn table_kind(self) -> TableKind {
        match self.timer_kind() {
            Some(kind) => kind.table_kind(),
            None => TableKind::Standard,
        }
    }

    /// `{tracker}/{child_id}`
    pub fn document(self, child_id: &str) -> DocumentPath {
        DocumentPath::root(self.collection(), child_id)
    }

    /// `{tracker}/{child_id}/{intervals|data}`
    pub fn entries(self, child_id: &str) -> CollectionPath {
        self.document(child_id).collection(self.entries_collection())
    }
}

impl fmt::Display for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

impl FromStr for Tracker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sleep" => Ok(Tracker::Sleep),
            "feed" | "feeding" => Ok(Tracker::Feed),
            "diaper" => Ok(Tracker::Diaper),
            "health" | "growth" => Ok(Tracker::Health),
            other => Err(Error::invalid_input(format!("unknown tracker: {}", other))),
        }
    }
}

/// `users/{uid}`
pub fn user(uid: &str) -> DocumentPath {
    DocumentPath::root(USERS_COLLECTION, uid)
}

/// `childs/{child_id}`
pub fn child(child_id: &str) -> DocumentPath {
    DocumentPath::root(CHILDREN_COLLECTION, child_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_uses_data_subcollection() {
        assert_eq!(Tracker::Health.entries("c1").to_string(), "health/c1/data");
        for tracker in [Tracker::Sleep, Tracker::Feed, Tracker::Diaper] {
            assert_eq!(
                tracker.entries("c1").to_string(),
                format!("{}/c1/intervals", tracker.collection())
            );
        }
    }

    #[test]
    fn test_tracker_table_selection() {
        assert_eq!(Tracker::Feed.table_kind(), TableKind::Feed);
        assert_eq!(Tracker::Sleep.table_kind(), TableKind::Standard);
        assert_eq!(Tracker::Diaper.table_kind(), TableKind::Standard);
        assert_eq!(Tracker::Health.timer_kind(), None);
    }

    #[test]
    fn test_tracker_parse() {
        assert_eq!("Feeding".parse::<Tracker>().unwrap(), Tracker::Feed);
        assert_eq!("growth".parse::<Tracker>().unwrap(), Tracker::Health);
        assert!("pump".parse::<Tracker>().is_err());
    }

    #[test]
    fn test_profile_paths() {
        assert_eq!(user("u1").to_string(), "users/u1");
        assert_eq!(child("c1").to_string(), "childs/c1");
    }
}
