//! Contract Test: Field Mapping Properties
//!
//! Generated documents for both built-in tables, with keys drawn from the
//! table's remote names, its local names, and strings neither table maps.
//!
//! Constraints verified:
//! - Remote → local → remote and local → remote → local are identities
//! - Unmapped keys survive conversion in both directions
//! - Mapped objects inside sequences are converted element by element
//! - Conversion never mutates its input, including arrays of objects

use huckleberry_core::mapping::{FieldTable, TableKind, to_local, to_remote};
use proptest::prelude::*;
use serde_json::{Map, Value};

const KINDS: [TableKind; 2] = [TableKind::Standard, TableKind::Feed];

fn mapped_by_any_table(key: &str) -> bool {
    KINDS.iter().any(|kind| {
        let table = kind.table();
        table.maps_remote(key) || table.maps_local(key)
    })
}

fn remote_names(table: &FieldTable) -> Vec<String> {
    table.iter().map(|(remote, _)| remote.to_string()).collect()
}

fn local_names(table: &FieldTable) -> Vec<String> {
    table.iter().map(|(_, local)| local.to_string()).collect()
}

/// Keys no built-in table maps in either direction
fn unmapped_key() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,11}".prop_filter("key is mapped", |key| !mapped_by_any_table(key))
}

/// A mix of the given table names and unmapped keys
fn key_from(names: Vec<String>) -> BoxedStrategy<String> {
    prop_oneof![
        3 => proptest::sample::select(names),
        1 => unmapped_key(),
    ]
    .boxed()
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e12f64..1.0e12).prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::String),
    ]
}

fn object(keys: BoxedStrategy<String>, values: impl Strategy<Value = Value>) -> impl Strategy<Value = Value> {
    proptest::collection::btree_map(keys, values, 0..6)
        .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<String, Value>>()))
}

/// Documents nested up to a few levels, with arrays of objects and scalars
fn document(keys: BoxedStrategy<String>) -> impl Strategy<Value = Value> {
    let nested_keys = keys.clone();
    let tree = leaf().prop_recursive(3, 48, 6, move |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            object(nested_keys.clone(), inner),
        ]
    });
    object(keys, tree)
}

fn remote_document(kind: TableKind) -> impl Strategy<Value = Value> {
    document(key_from(remote_names(kind.table())))
}

fn local_document(kind: TableKind) -> impl Strategy<Value = Value> {
    document(key_from(local_names(kind.table())))
}

fn any_kind() -> impl Strategy<Value = TableKind> {
    proptest::sample::select(KINDS.to_vec())
}

proptest! {
    #[test]
    fn remote_round_trip_is_identity(
        (kind, remote) in any_kind().prop_flat_map(|kind| (Just(kind), remote_document(kind)))
    ) {
        let table = kind.table();
        prop_assert_eq!(to_remote(&to_local(&remote, table), table), remote);
    }

    #[test]
    fn local_round_trip_is_identity(
        (kind, local) in any_kind().prop_flat_map(|kind| (Just(kind), local_document(kind)))
    ) {
        let table = kind.table();
        prop_assert_eq!(to_local(&to_remote(&local, table), table), local);
    }

    #[test]
    fn unmapped_keys_survive_both_directions(
        (kind, remote) in any_kind().prop_flat_map(|kind| (Just(kind), remote_document(kind))),
        extra in unmapped_key(),
        value in leaf(),
    ) {
        let table = kind.table();
        let Value::Object(mut map) = remote else { unreachable!() };
        map.insert(extra.clone(), value.clone());
        let input = Value::Object(map);

        let local = to_local(&input, table);
        prop_assert_eq!(&local[&extra], &value);
        let remote = to_remote(&input, table);
        prop_assert_eq!(&remote[&extra], &value);

        for (key, _) in input.as_object().into_iter().flatten() {
            if !table.maps_remote(key) {
                prop_assert!(local.get(key).is_some(), "{} dropped", key);
            }
        }
    }

    #[test]
    fn objects_in_sequences_convert_like_top_level(
        (kind, items) in any_kind().prop_flat_map(|kind| {
            (Just(kind), proptest::collection::vec(remote_document(kind), 0..5))
        })
    ) {
        let table = kind.table();
        let mut wrapper = Map::new();
        wrapper.insert("entries".to_string(), Value::Array(items.clone()));

        let converted = to_local(&Value::Object(wrapper), table);
        let expected: Vec<Value> = items.iter().map(|item| to_local(item, table)).collect();
        prop_assert_eq!(&converted["entries"], &Value::Array(expected));
    }

    #[test]
    fn conversion_leaves_input_untouched(
        (kind, items) in any_kind().prop_flat_map(|kind| {
            (Just(kind), proptest::collection::vec(remote_document(kind), 1..4))
        })
    ) {
        let table = kind.table();
        let mut map = Map::new();
        map.insert("intervals".to_string(), Value::Array(items));
        map.insert("start".to_string(), Value::from(100));
        let input = Value::Object(map);
        let before = input.clone();

        let _ = to_local(&input, table);
        let _ = to_remote(&input, table);
        prop_assert_eq!(input, before);
    }
}
