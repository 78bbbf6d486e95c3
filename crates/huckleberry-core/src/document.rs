//! Document model and store paths
//!
//! Documents are untyped JSON objects. [`serde_json::Value`] already is the
//! scalar / sequence / mapping union the converter walks, so no wrapper type
//! is introduced.

use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};

/// A document body: string keys to arbitrary JSON values
pub type Document = Map<String, Value>;

/// Path to a single document, e.g. `sleep/{child_id}`
///
/// Always an even number of non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

/// Path to a collection, e.g. `sleep/{child_id}/intervals`
///
/// Always an odd number of non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

fn parse_segments(path: &str) -> Result<Vec<String>> {
    let segments: Vec<String> = path.trim_matches('/').split('/').map(str::to_string).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::invalid_input(format!("path has an empty segment: {}", path)));
    }
    Ok(segments)
}

impl DocumentPath {
    /// Parse a slash-separated document path
    pub fn parse(path: &str) -> Result<Self> {
        let segments = parse_segments(path)?;
        if segments.len() % 2 != 0 {
            return Err(Error::invalid_input(format!(
                "document path needs an even number of segments: {}",
                path
            )));
        }
        Ok(Self { segments })
    }

    /// Top-level document `{collection}/{id}`
    pub fn root(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            segments: vec![collection.into(), id.into()],
        }
    }

    /// Sub-collection of this document
    pub fn collection(&self, name: impl Into<String>) -> CollectionPath {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        CollectionPath { segments }
    }

    /// Document id (last segment)
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Collection containing this document
    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// Path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl CollectionPath {
    /// Parse a slash-separated collection path
    pub fn parse(path: &str) -> Result<Self> {
        let segments = parse_segments(path)?;
        if segments.len() % 2 != 1 {
            return Err(Error::invalid_input(format!(
                "collection path needs an odd number of segments: {}",
                path
            )));
        }
        Ok(Self { segments })
    }

    /// Document with `id` inside this collection
    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        let mut segments = self.segments.clone();
        segments.push(id.into());
        DocumentPath { segments }
    }

    /// Collection id (last segment)
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Document owning this collection, `None` for top-level collections
    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() < 3 {
            return None;
        }
        Some(DocumentPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// A document read back from a collection query
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Full path of the document
    pub path: DocumentPath,
    /// Document body (remote field names)
    pub data: Document,
}

impl StoredDocument {
    /// Document id
    pub fn id(&self) -> &str {
        self.path.id()
    }
}

/// Read the value at a dot-separated field path
pub fn get_field<'a>(doc: &'a Document, field_path: &str) -> Option<&'a Value> {
    let mut parts = field_path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Write `value` at a dot-separated field path
///
/// Missing or non-object intermediate values are replaced by empty objects.
pub fn set_field(doc: &mut Document, field_path: &str, value: Value) {
    let parts: Vec<&str> = field_path.split('.').collect();
    let (last, parents) = match parts.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut current = doc;
    for part in parents {
        let slot = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => unreachable!("slot was just made an object"),
        };
    }
    current.insert(last.to_string(), value);
}

/// Apply every `field path → value` entry of `fields` to `doc`
pub fn merge_fields(doc: &mut Document, fields: &Document) {
    for (field_path, value) in fields {
        set_field(doc, field_path, value.clone());
    }
}
