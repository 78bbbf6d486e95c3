// # Firestore value codec
//
// The REST API wraps every value in a single-key object naming its type:
//
// ```json
// {"fields": {"start": {"doubleValue": 1764528069.5},
//             "mode": {"stringValue": "bottle"},
//             "quantity": {"mapValue": {"fields": {"pee": {"integerValue": "50"}}}}}}
// ```
//
// Integers travel as decimal strings. Timestamps decode to
// `{"seconds": i64, "nanos": i64}`, the same shape the app writes for
// timer stamps.

use chrono::{DateTime, Utc};
use huckleberry_core::document::Document;
use huckleberry_core::{Error, Result};
use serde_json::{Map, Number, Value, json};

/// Wrap a JSON value in its Firestore type tag
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or(0.0) })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            if items.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                let values: Vec<Value> = items.iter().map(encode_value).collect();
                json!({ "arrayValue": { "values": values } })
            }
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode a document body as a `fields` map
pub fn encode_fields(doc: &Document) -> Value {
    Value::Object(
        doc.iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

/// Encode a document body for a write request
pub fn encode_document(doc: &Document) -> Value {
    json!({ "fields": encode_fields(doc) })
}

/// Unwrap a Firestore typed value
pub fn decode_value(value: &Value) -> Result<Value> {
    let Some(tagged) = value.as_object() else {
        return Err(malformed("typed value is not an object", value));
    };
    let Some((tag, inner)) = tagged.iter().next() else {
        return Err(malformed("typed value has no type tag", value));
    };

    match tag.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| malformed("booleanValue is not a bool", inner)),
        "integerValue" => decode_integer(inner),
        "doubleValue" => decode_double(inner),
        "timestampValue" => decode_timestamp(inner),
        "stringValue" | "bytesValue" | "referenceValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| malformed("string value is not a string", inner)),
        "geoPointValue" => Ok(json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values.iter().map(decode_value).collect::<Result<_>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = inner.get("fields").cloned().unwrap_or_else(|| json!({}));
            Ok(Value::Object(decode_fields(&fields)?))
        }
        other => Err(Error::provider(
            "firestore",
            format!("unsupported value type: {}", other),
        )),
    }
}

/// Decode a `fields` map into a document body
pub fn decode_fields(fields: &Value) -> Result<Document> {
    let Some(fields) = fields.as_object() else {
        return Err(malformed("fields is not an object", fields));
    };
    let mut doc = Map::with_capacity(fields.len());
    for (key, value) in fields {
        doc.insert(key.clone(), decode_value(value)?);
    }
    Ok(doc)
}

/// Decode a REST document resource into its full name and body
pub fn decode_document(resource: &Value) -> Result<(String, Document)> {
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("document has no name", resource))?
        .to_string();
    let doc = match resource.get("fields") {
        Some(fields) => decode_fields(fields)?,
        None => Map::new(),
    };
    Ok((name, doc))
}

fn decode_integer(inner: &Value) -> Result<Value> {
    let parsed = match inner {
        Value::String(s) => s.parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    };
    parsed
        .map(Value::from)
        .ok_or_else(|| malformed("integerValue is not an integer", inner))
}

fn decode_double(inner: &Value) -> Result<Value> {
    match inner {
        // Whole doubles arrive without a fraction
        Value::Number(n) => Ok(n.as_f64().map(number).unwrap_or(Value::Null)),
        // NaN and infinities come back as strings and have no JSON form
        Value::String(_) => Ok(Value::Null),
        _ => Err(malformed("doubleValue is not a number", inner)),
    }
}

fn decode_timestamp(inner: &Value) -> Result<Value> {
    let text = inner
        .as_str()
        .ok_or_else(|| malformed("timestampValue is not a string", inner))?;
    let parsed: DateTime<Utc> = DateTime::parse_from_rfc3339(text)
        .map_err(|e| Error::provider("firestore", format!("invalid timestamp {}: {}", text, e)))?
        .with_timezone(&Utc);
    Ok(json!({
        "seconds": parsed.timestamp(),
        "nanos": parsed.timestamp_subsec_nanos(),
    }))
}

fn malformed(what: &str, value: &Value) -> Error {
    Error::provider("firestore", format!("{}: {}", what, value))
}

/// Quote one field-path segment when it is not a plain identifier
pub fn quote_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    let simple = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
    if simple {
        return segment.to_string();
    }

    let escaped = segment.replace('\\', "\\\\").replace('`', "\\`");
    format!("`{}`", escaped)
}

/// Quote a dot-separated field path for `updateMask` and queries
pub fn quote_field_path(path: &str) -> String {
    path.split('.').map(quote_segment).collect::<Vec<_>>().join(".")
}

/// Number as JSON, or null for non-finite values
fn number(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}
