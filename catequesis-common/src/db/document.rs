//! Document representation and path helpers

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::db::temporal::is_temporal;
use crate::{Error, Result};

/// A stored document: a JSON object in extended-JSON form
pub type Document = Map<String, Value>;

/// Name of the primary key field inside every document
pub const ID_FIELD: &str = "_id";

/// Serialize a record into a document
pub fn to_document<T: Serialize>(record: &T) -> Result<Document> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Internal(format!(
            "Record did not serialize to an object: {}",
            other
        ))),
    }
}

/// Deserialize a document into a record
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// `_id` of a document when it is a string
pub fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

/// Collect every value found at a dotted path
///
/// Arrays met before the last segment are descended element by element, so
/// `calificaciones.fecha` yields the `fecha` of each grade entry. Temporal
/// values are leaves and are never descended into.
pub fn values_at_path<'a>(document: &'a Document, path: &str) -> Vec<&'a Value> {
    let mut segments = path.split('.');
    let first = match segments.next() {
        Some(s) => s,
        None => return Vec::new(),
    };

    let mut current: Vec<&Value> = document.get(first).into_iter().collect();
    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            collect_child(value, segment, &mut next);
        }
        current = next;
    }
    current
}

fn collect_child<'a>(value: &'a Value, segment: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                if let Value::Object(map) = item {
                    if !is_temporal(item) {
                        out.extend(map.get(segment));
                    }
                }
            }
        }
        Value::Object(map) if !is_temporal(value) => out.extend(map.get(segment)),
        _ => {}
    }
}

/// JSON path expression for a top-level key, as used by SQLite `json_*` functions
///
/// Keys are quoted so `_id` and keys with unusual characters address correctly.
pub fn json_path_for_key(key: &str) -> Result<String> {
    if key.is_empty() || key.contains('"') || key.contains('\\') {
        return Err(Error::InvalidInput(format!("Unsupported field name: {:?}", key)));
    }
    Ok(format!("$.\"{}\"", key))
}
