//! Contract Test: Field Name Mapping
//!
//! This test verifies the translation between database field names and
//! client field names.
//!
//! Constraints verified:
//! - Remote → local → remote returns the original document
//! - Keys outside the tables pass through unchanged
//! - Nested mappings and mappings inside sequences are converted
//! - Sleep and feed timers label `timerStartTime` differently
//! - Conversion never mutates its input
//! - Writing a key only the other timer table knows logs a warning
//!
//! If this test fails, documents written by this crate will no longer be
//! readable by the app (or the other way around).

mod common;

use common::{capture_warnings, doc};
use huckleberry_core::mapping::{
    Direction, FieldTable, TableKind, TimerKind, convert, document_to_local, to_local, to_remote,
};
use serde_json::{Value, json};

fn sleep_document() -> Value {
    json!({
        "timer": {
            "active": true,
            "paused": false,
            "timestamp": {"seconds": 1764528069.5},
            "local_timestamp": 1764528069.5,
            "timerStartTime": 1764528069500.0,
            "uuid": "0123456789abcdef"
        },
        "prefs": {
            "lastSleep": {"start": 1764520000.0, "duration": 3600.0, "offset": -300.0}
        }
    })
}

fn feed_document() -> Value {
    json!({
        "timer": {
            "active": true,
            "feedStartTime": 1764528000.0,
            "timerStartTime": 1764528069.0,
            "leftDuration": 120.0,
            "rightDuration": 0.0,
            "lastSide": "none",
            "activeSide": "left"
        },
        "prefs": {"bottleType": "Formula", "bottleAmount": 120.0, "bottleUnits": "ml"}
    })
}

#[test]
fn example_interval_converts_with_default_table() {
    let remote = json!({
        "start": 100,
        "lastUpdated": 200,
        "offset": -300,
        "details": {"lastSide": "left"}
    });

    let local = to_local(&remote, FieldTable::standard());

    assert_eq!(
        local,
        json!({
            "start_sec": 100,
            "last_updated_sec": 200,
            "offset_min": -300,
            "details": {"last_side": "left"}
        })
    );
}

#[test]
fn round_trip_restores_remote_documents() {
    for (remote, kind) in [
        (sleep_document(), TimerKind::Sleep),
        (feed_document(), TimerKind::Feed),
    ] {
        let table = kind.table();
        let local = to_local(&remote, table);
        assert_ne!(local, remote, "{:?} document should have mapped keys", kind);
        assert_eq!(to_remote(&local, table), remote, "{:?} round trip", kind);
    }
}

#[test]
fn round_trip_restores_local_documents() {
    let local = json!({
        "name": "Ada",
        "birthday": "2024-05-01",
        "night_start_min": 1140,
        "morning_cutoff_min": 420,
        "expected_naps": 3,
        "created_at": {"seconds": 1714521600}
    });
    let table = FieldTable::standard();

    assert_eq!(to_local(&to_remote(&local, table), table), local);
}

#[test]
fn unknown_keys_pass_through_both_ways() {
    let document = json!({"mode": "bottle", "bottleType": "Mixed", "quantity": {"pee": 50}});

    for kind in [TableKind::Standard, TableKind::Feed] {
        assert_eq!(to_local(&document, kind.table()), document);
        assert_eq!(to_remote(&document, kind.table()), document);
    }
}

#[test]
fn nested_mappings_are_converted_at_every_depth() {
    let remote = json!({"a": {"b": {"c": {"start": 1, "feedStartTime": 2}}}});

    assert_eq!(
        to_local(&remote, FieldTable::feed()),
        json!({"a": {"b": {"c": {"start_sec": 1, "feed_start_time_sec": 2}}}})
    );
}

#[test]
fn mappings_inside_sequences_are_converted() {
    let remote = json!({
        "intervals": [
            {"start": 1, "duration": 10},
            "untouched",
            42,
            {"end_offset": -300}
        ]
    });

    assert_eq!(
        to_local(&remote, FieldTable::standard()),
        json!({
            "intervals": [
                {"start_sec": 1, "duration_sec": 10},
                "untouched",
                42,
                {"end_offset_min": -300}
            ]
        })
    );
}

#[test]
fn sleep_and_feed_tables_diverge_on_timer_start() {
    let remote = json!({"timerStartTime": 1000});

    assert_eq!(
        to_local(&remote, TimerKind::Sleep.table()),
        json!({"timer_start_time_ms": 1000})
    );
    assert_eq!(
        to_local(&remote, TimerKind::Feed.table()),
        json!({"timer_start_time_sec": 1000})
    );

    // Every other pair is shared
    let sleep = TimerKind::Sleep.table();
    let feed = TimerKind::Feed.table();
    let differing: Vec<&str> = sleep
        .iter()
        .filter(|(remote, local)| feed.local_name(remote) != *local)
        .map(|(remote, _)| remote)
        .collect();
    assert_eq!(differing, vec!["timerStartTime"]);
}

#[test]
fn foreign_local_name_is_written_unchanged() {
    // The feed timer's local name is not known to the sleep table
    let local = json!({"timer_start_time_sec": 5});
    assert_eq!(to_remote(&local, FieldTable::standard()), local);
}

#[test]
fn foreign_local_name_logs_one_warning() {
    let local = json!({"timer_start_time_sec": 5});

    let (remote, logs) = capture_warnings(|| to_remote(&local, FieldTable::standard()));
    assert_eq!(remote, local);
    let warnings = logs.warnings();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("timer_start_time_sec"), "{}", warnings[0]);

    // The matching table maps it, so nothing is logged
    let (remote, logs) = capture_warnings(|| to_remote(&local, FieldTable::feed()));
    assert_eq!(remote, json!({"timerStartTime": 5}));
    assert!(logs.warnings().is_empty(), "{:?}", logs.warnings());
}

#[test]
fn sleep_timer_name_under_feed_table_logs_one_warning() {
    let local = json!({"timer": {"timer_start_time_ms": 5000, "active": true}});

    let (remote, logs) = capture_warnings(|| to_remote(&local, FieldTable::feed()));
    assert_eq!(remote, local);
    let warnings = logs.warnings();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("timer_start_time_ms"), "{}", warnings[0]);
}

#[test]
fn well_formed_conversion_logs_nothing() {
    let (_, logs) = capture_warnings(|| {
        let local = to_local(&sleep_document(), FieldTable::standard());
        to_remote(&local, FieldTable::standard())
    });
    assert!(logs.warnings().is_empty(), "{:?}", logs.warnings());
}

#[test]
fn name_collision_keeps_last_value_and_warns() {
    // `start` becomes `start_sec`, then the literal `start_sec` overwrites it
    let remote = json!({"start": 1, "start_sec": 2});

    let (local, logs) = capture_warnings(|| to_local(&remote, FieldTable::standard()));
    assert_eq!(local, json!({"start_sec": 2}));
    let warnings = logs.warnings();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("start_sec"), "{}", warnings[0]);
}

#[test]
fn conversion_does_not_mutate_input() {
    let remote = sleep_document();
    let before = remote.clone();

    let _ = to_local(&remote, FieldTable::standard());
    let _ = convert(&remote, FieldTable::feed(), Direction::ToLocal);

    assert_eq!(remote, before);
}

#[test]
fn document_helpers_match_value_conversion() {
    let remote = doc(sleep_document());
    let local = document_to_local(&remote, FieldTable::standard());

    assert_eq!(
        Value::Object(local),
        to_local(&sleep_document(), FieldTable::standard())
    );
}

#[test]
fn runtime_table_rejects_duplicate_local_names() {
    let result = FieldTable::from_pairs([("start", "start_sec"), ("begin", "start_sec")]);
    assert!(result.is_err());

    let overridden = FieldTable::standard().with_overrides(&[("start", "duration_sec")]);
    assert!(overridden.is_err());
}
