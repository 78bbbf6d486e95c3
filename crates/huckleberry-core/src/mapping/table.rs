// # Field Mapping Tables
//
// Bidirectional association between remote (camelCase, as stored in the
// document database) and local (snake_case, unit-suffixed) field names.
//
// ## Tables
//
// - **Standard**: used for child profiles, sleep documents, and all entries.
// - **Feed**: the standard table with `timerStartTime` remapped to seconds.
//
// Sleep and feed timers share the remote key `timerStartTime` but store
// different units (milliseconds vs seconds). Picking the wrong table does not
// fail, it mislabels the unit, so table selection goes through [`TableKind`].
//
// ## Invariants
//
// - No table contains a duplicate remote or local name, so each reverse table
//   is an exact inverse. The built-in tables are checked at compile time;
//   runtime-assembled tables are checked by [`FieldTable::from_pairs`].

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// Remote → local names shared by every record type
pub const BASE_FIELDS: &[(&str, &str)] = &[
    // Child profile
    ("birthdate", "birthday"),
    ("createdAt", "created_at"),
    ("nightStart", "night_start_min"),
    ("morningCutoff", "morning_cutoff_min"),
    ("expectedNaps", "expected_naps"),
    // Timers
    ("local_timestamp", "local_timestamp_sec"),
    ("timerStartTime", "timer_start_time_ms"),
    ("feedStartTime", "feed_start_time_sec"),
    ("leftDuration", "left_duration_sec"),
    ("rightDuration", "right_duration_sec"),
    ("lastSide", "last_side"),
    ("activeSide", "active_side"),
    // Intervals
    ("lastUpdated", "last_updated_sec"),
    ("start", "start_sec"),
    ("duration", "duration_sec"),
    ("offset", "offset_min"),
    ("end_offset", "end_offset_min"),
];

/// Entries replaced in [`BASE_FIELDS`] to form the feed table
pub const FEED_OVERRIDES: &[(&str, &str)] = &[("timerStartTime", "timer_start_time_sec")];

const fn str_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Local name of `base[index]` after applying `overrides`
const fn effective_local(
    base: &[(&'static str, &'static str)],
    overrides: &[(&'static str, &'static str)],
    index: usize,
) -> &'static str {
    let mut j = 0;
    while j < overrides.len() {
        if str_eq(overrides[j].0, base[index].0) {
            return overrides[j].1;
        }
        j += 1;
    }
    base[index].1
}

const fn has_duplicate_remote(base: &[(&str, &str)]) -> bool {
    let mut i = 0;
    while i < base.len() {
        let mut j = i + 1;
        while j < base.len() {
            if str_eq(base[i].0, base[j].0) {
                return true;
            }
            j += 1;
        }
        i += 1;
    }
    false
}

const fn has_duplicate_local(
    base: &[(&'static str, &'static str)],
    overrides: &[(&'static str, &'static str)],
) -> bool {
    let mut i = 0;
    while i < base.len() {
        let mut j = i + 1;
        while j < base.len() {
            if str_eq(
                effective_local(base, overrides, i),
                effective_local(base, overrides, j),
            ) {
                return true;
            }
            j += 1;
        }
        i += 1;
    }
    false
}

const fn overrides_are_known(base: &[(&str, &str)], overrides: &[(&str, &str)]) -> bool {
    let mut j = 0;
    while j < overrides.len() {
        let mut found = false;
        let mut i = 0;
        while i < base.len() {
            if str_eq(base[i].0, overrides[j].0) {
                found = true;
            }
            i += 1;
        }
        if !found {
            return false;
        }
        j += 1;
    }
    true
}

const _: () = assert!(
    !has_duplicate_remote(BASE_FIELDS),
    "BASE_FIELDS contains a duplicate remote name"
);
const _: () = assert!(
    !has_duplicate_local(BASE_FIELDS, &[]),
    "standard table contains a duplicate local name"
);
const _: () = assert!(
    overrides_are_known(BASE_FIELDS, FEED_OVERRIDES),
    "FEED_OVERRIDES names a field missing from BASE_FIELDS"
);
const _: () = assert!(
    !has_duplicate_local(BASE_FIELDS, FEED_OVERRIDES),
    "feed table contains a duplicate local name"
);

static STANDARD: LazyLock<FieldTable> =
    LazyLock::new(|| FieldTable::from_checked(TableKind::Standard, BASE_FIELDS, &[]));

static FEED: LazyLock<FieldTable> =
    LazyLock::new(|| FieldTable::from_checked(TableKind::Feed, BASE_FIELDS, FEED_OVERRIDES));

/// Selector for the built-in mapping tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Default table (`timerStartTime` in milliseconds)
    Standard,
    /// Feed-timer table (`timerStartTime` in seconds)
    Feed,
    /// Table assembled at runtime
    Custom,
}

impl TableKind {
    /// Get the built-in table for this kind
    ///
    /// `Custom` has no built-in table and resolves to the standard one.
    pub fn table(self) -> &'static FieldTable {
        match self {
            TableKind::Feed => &FEED,
            TableKind::Standard | TableKind::Custom => &STANDARD,
        }
    }
}

/// Which kind of resumable timer a document holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Sleep timer (start time in milliseconds)
    Sleep,
    /// Feeding timer (start time in seconds)
    Feed,
}

impl TimerKind {
    /// Get the table that labels this timer's units correctly
    pub fn table_kind(self) -> TableKind {
        match self {
            TimerKind::Sleep => TableKind::Standard,
            TimerKind::Feed => TableKind::Feed,
        }
    }

    /// Shortcut for `self.table_kind().table()`
    pub fn table(self) -> &'static FieldTable {
        self.table_kind().table()
    }
}

/// A bidirectional remote ↔ local field name table
#[derive(Debug, Clone)]
pub struct FieldTable {
    kind: TableKind,
    to_local: HashMap<String, String>,
    to_remote: HashMap<String, String>,
}

impl FieldTable {
    /// Get the standard table
    pub fn standard() -> &'static FieldTable {
        &STANDARD
    }

    /// Get the feed-timer table
    pub fn feed() -> &'static FieldTable {
        &FEED
    }

    /// Build a table from pairs already validated by the const assertions above
    fn from_checked(
        kind: TableKind,
        base: &[(&str, &str)],
        overrides: &[(&str, &str)],
    ) -> Self {
        let mut to_local: HashMap<String, String> = base
            .iter()
            .map(|(remote, local)| (remote.to_string(), local.to_string()))
            .collect();
        for (remote, local) in overrides {
            to_local.insert(remote.to_string(), local.to_string());
        }
        let to_remote = to_local
            .iter()
            .map(|(remote, local)| (local.clone(), remote.clone()))
            .collect();

        Self {
            kind,
            to_local,
            to_remote,
        }
    }

    /// Build a table from remote → local pairs
    ///
    /// Fails if a remote name or a local name appears twice, since the
    /// reverse table would then be ambiguous.
    pub fn from_pairs<I, R, L>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (R, L)>,
        R: Into<String>,
        L: Into<String>,
    {
        let mut to_local = HashMap::new();
        let mut to_remote = HashMap::new();

        for (remote, local) in pairs {
            let remote = remote.into();
            let local = local.into();

            if to_local.contains_key(&remote) {
                return Err(Error::mapping(format!(
                    "duplicate remote field name: {}",
                    remote
                )));
            }
            if let Some(existing) = to_remote.get(&local) {
                return Err(Error::mapping(format!(
                    "local field name {} is mapped from both {} and {}",
                    local, existing, remote
                )));
            }

            to_remote.insert(local.clone(), remote.clone());
            to_local.insert(remote, local);
        }

        Ok(Self {
            kind: TableKind::Custom,
            to_local,
            to_remote,
        })
    }

    /// Derive a new table by replacing the local name of existing entries
    ///
    /// Every overridden remote name must already be present.
    pub fn with_overrides<R, L>(&self, overrides: &[(R, L)]) -> Result<Self>
    where
        R: AsRef<str>,
        L: AsRef<str>,
    {
        let mut pairs = self.to_local.clone();
        for (remote, local) in overrides {
            let entry = pairs.get_mut(remote.as_ref()).ok_or_else(|| {
                Error::mapping(format!(
                    "cannot override unknown remote field: {}",
                    remote.as_ref()
                ))
            })?;
            *entry = local.as_ref().to_string();
        }
        Self::from_pairs(pairs)
    }

    /// Which table this is
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Translate a remote name, keeping it unchanged when unmapped
    pub fn local_name<'a>(&'a self, remote: &'a str) -> &'a str {
        self.to_local.get(remote).map(String::as_str).unwrap_or(remote)
    }

    /// Translate a local name, keeping it unchanged when unmapped
    pub fn remote_name<'a>(&'a self, local: &'a str) -> &'a str {
        self.to_remote.get(local).map(String::as_str).unwrap_or(local)
    }

    /// Whether `remote` has an entry in this table
    pub fn maps_remote(&self, remote: &str) -> bool {
        self.to_local.contains_key(remote)
    }

    /// Whether `local` has an entry in this table
    pub fn maps_local(&self, local: &str) -> bool {
        self.to_remote.contains_key(local)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.to_local.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.to_local.is_empty()
    }

    /// Iterate over (remote, local) pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.to_local
            .iter()
            .map(|(remote, local)| (remote.as_str(), local.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_contents() {
        let table = FieldTable::standard();
        assert_eq!(table.len(), BASE_FIELDS.len());
        assert_eq!(table.local_name("timerStartTime"), "timer_start_time_ms");
        assert_eq!(table.local_name("end_offset"), "end_offset_min");
        assert_eq!(table.remote_name("birthday"), "birthdate");
    }

    #[test]
    fn test_feed_table_overrides_only_timer_start() {
        let standard = FieldTable::standard();
        let feed = FieldTable::feed();

        assert_eq!(feed.local_name("timerStartTime"), "timer_start_time_sec");
        assert_eq!(feed.remote_name("timer_start_time_sec"), "timerStartTime");
        assert!(!feed.maps_local("timer_start_time_ms"));

        let differing: Vec<_> = standard
            .iter()
            .filter(|(remote, local)| feed.local_name(remote) != *local)
            .collect();
        assert_eq!(differing, vec![("timerStartTime", "timer_start_time_ms")]);
    }

    #[test]
    fn test_reverse_tables_are_inverses() {
        for table in [FieldTable::standard(), FieldTable::feed()] {
            for (remote, local) in table.iter() {
                assert_eq!(table.remote_name(local), remote);
            }
        }
    }

    #[test]
    fn test_from_pairs_rejects_duplicate_local() {
        let result = FieldTable::from_pairs([("start", "start_sec"), ("begin", "start_sec")]);
        assert!(matches!(result, Err(Error::Mapping(_))));
    }

    #[test]
    fn test_from_pairs_rejects_duplicate_remote() {
        let result = FieldTable::from_pairs([("start", "start_sec"), ("start", "begin_sec")]);
        assert!(matches!(result, Err(Error::Mapping(_))));
    }

    #[test]
    fn test_with_overrides_rejects_unknown_field() {
        let result = FieldTable::standard().with_overrides(&[("nope", "nope_sec")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_with_overrides_detects_collision() {
        // duration_sec is already the local name of "duration"
        let result = FieldTable::standard().with_overrides(&[("start", "duration_sec")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_timer_kind_selects_table() {
        assert_eq!(TimerKind::Sleep.table().kind(), TableKind::Standard);
        assert_eq!(TimerKind::Feed.table().kind(), TableKind::Feed);
    }

    #[test]
    fn test_unmapped_names_pass_through() {
        let table = FieldTable::standard();
        assert_eq!(table.local_name("bottleType"), "bottleType");
        assert_eq!(table.remote_name("bottleType"), "bottleType");
    }
}
