//! Recursive document converter
//!
//! Applies a [`FieldTable`] to an arbitrary JSON tree. Objects are rebuilt
//! with translated keys, arrays have their object elements converted, and
//! every other value is an opaque leaf copied as-is. The input is only
//! borrowed, so the caller's data is never touched.

use serde_json::{Map, Value};
use tracing::warn;

use super::table::FieldTable;
use crate::document::Document;

/// Direction of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// camelCase database names → snake_case unit-suffixed names
    ToLocal,
    /// snake_case unit-suffixed names → camelCase database names
    ToRemote,
}

/// Convert a remote value to local field names
pub fn to_local(value: &Value, table: &FieldTable) -> Value {
    convert(value, table, Direction::ToLocal)
}

/// Convert a local value to remote field names
pub fn to_remote(value: &Value, table: &FieldTable) -> Value {
    convert(value, table, Direction::ToRemote)
}

/// Convert a remote document to local field names
pub fn document_to_local(doc: &Document, table: &FieldTable) -> Document {
    convert_map(doc, table, Direction::ToLocal)
}

/// Convert a local document to remote field names
pub fn document_to_remote(doc: &Document, table: &FieldTable) -> Document {
    convert_map(doc, table, Direction::ToRemote)
}

/// Convert `value` in the given direction
///
/// Non-object input is returned unchanged.
pub fn convert(value: &Value, table: &FieldTable, direction: Direction) -> Value {
    match value {
        Value::Object(map) => Value::Object(convert_map(map, table, direction)),
        other => other.clone(),
    }
}

fn convert_map(map: &Map<String, Value>, table: &FieldTable, direction: Direction) -> Map<String, Value> {
    let mut result = Map::with_capacity(map.len());

    for (key, value) in map {
        let value = match value {
            Value::Object(_) => convert(value, table, direction),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| {
                        if item.is_object() {
                            convert(item, table, direction)
                        } else {
                            item.clone()
                        }
                    })
                    .collect(),
            ),
            other => other.clone(),
        };

        let renamed = match direction {
            Direction::ToLocal => table.local_name(key),
            Direction::ToRemote => {
                if !table.maps_local(key) {
                    warn_on_foreign_local_name(key, table);
                }
                table.remote_name(key)
            }
        };

        if result.insert(renamed.to_string(), value).is_some() {
            warn!(
                field = renamed,
                source = key.as_str(),
                "two fields convert to the same name; the earlier value is dropped"
            );
        }
    }

    result
}

/// Flag local names that only a different built-in table knows about
///
/// Such a key passes through unchanged, which means the document was most
/// likely converted with the wrong table (e.g. a feed timer with the
/// standard table) and the remote document will carry a snake_case field.
fn warn_on_foreign_local_name(key: &str, table: &FieldTable) {
    let other = [FieldTable::standard(), FieldTable::feed()]
        .into_iter()
        .find(|candidate| candidate.kind() != table.kind() && candidate.maps_local(key));

    if let Some(other) = other {
        warn!(
            field = key,
            table = ?table.kind(),
            expected = ?other.kind(),
            "local field is not mapped by the selected table; it will be written unchanged"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_is_returned_unchanged() {
        let table = FieldTable::standard();
        assert_eq!(to_local(&json!(42), table), json!(42));
        assert_eq!(to_remote(&json!("start"), table), json!("start"));
        assert_eq!(to_local(&Value::Null, table), Value::Null);
    }

    #[test]
    fn test_top_level_array_is_opaque() {
        // Only object values are walked; a bare array is a leaf
        let input = json!([{"start": 1}]);
        assert_eq!(to_local(&input, FieldTable::standard()), input);
    }

    #[test]
    fn test_nested_arrays_are_not_descended() {
        let input = json!({"rows": [[{"start": 1}]]});
        let output = to_local(&input, FieldTable::standard());
        assert_eq!(output, json!({"rows": [[{"start": 1}]]}));
    }

    #[test]
    fn test_document_helpers_match_value_helpers() {
        let table = FieldTable::feed();
        let doc = json!({"timerStartTime": 5, "extra": true});
        let Value::Object(map) = &doc else {
            unreachable!()
        };

        assert_eq!(
            Value::Object(document_to_local(map, table)),
            to_local(&doc, table)
        );
    }

    #[test]
    fn test_foreign_local_name_still_passes_through() {
        let input = json!({"timer_start_time_sec": 10});
        let output = to_remote(&input, FieldTable::standard());
        assert_eq!(output, json!({"timer_start_time_sec": 10}));
    }
}
