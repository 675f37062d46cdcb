//! Normalization targets and the per-document rewrite

use serde_json::Value;
use std::fmt;

use crate::db::{Document, Temporal};

/// An embedded date field to normalize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    /// `field` of the embedded object stored at top-level `parent`
    Object { parent: String, field: String },
    /// `field` of every object element of the top-level array `array`
    ArrayElements { array: String, field: String },
}

impl FieldTarget {
    pub fn object(parent: &str, field: &str) -> Self {
        FieldTarget::Object {
            parent: parent.to_string(),
            field: field.to_string(),
        }
    }

    pub fn array_elements(array: &str, field: &str) -> Self {
        FieldTarget::ArrayElements {
            array: array.to_string(),
            field: field.to_string(),
        }
    }

    /// Top-level field a rewrite replaces
    pub fn container(&self) -> &str {
        match self {
            FieldTarget::Object { parent, .. } => parent,
            FieldTarget::ArrayElements { array, .. } => array,
        }
    }

    /// Dotted path as used by collection validators
    pub fn dotted_path(&self) -> String {
        match self {
            FieldTarget::Object { parent, field } => format!("{}.{}", parent, field),
            FieldTarget::ArrayElements { array, field } => format!("{}.{}", array, field),
        }
    }

    /// Rewritten container value, or `None` when nothing in it needs converting
    ///
    /// A container of the wrong shape (not an object, not an array, or itself a
    /// stored temporal) never matches.
    pub fn rewrite(&self, container: &Value) -> Option<Value> {
        match self {
            FieldTarget::Object { field, .. } => {
                let mut object = container.clone();
                convert_member(&mut object, field).then_some(object)
            }
            FieldTarget::ArrayElements { field, .. } => {
                let mut array = container.as_array()?.clone();
                let mut changed = false;
                for element in &mut array {
                    changed |= convert_member(element, field);
                }
                changed.then_some(Value::Array(array))
            }
        }
    }
}

impl fmt::Display for FieldTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTarget::Object { parent, field } => write!(f, "{}.{}", parent, field),
            FieldTarget::ArrayElements { array, field } => write!(f, "{}[].{}", array, field),
        }
    }
}

/// Replace a temporal member of an object with its `YYYY-MM-DD` string
fn convert_member(object: &mut Value, field: &str) -> bool {
    if Temporal::from_value(object).is_some() {
        return false;
    }
    let Some(map) = object.as_object_mut() else {
        return false;
    };
    let Some(member) = map.get_mut(field) else {
        return false;
    };
    match Temporal::from_value(member) {
        Some(temporal) => {
            *member = Value::String(temporal.to_calendar_string());
            true
        }
        None => false,
    }
}

/// Compute the scoped update that normalizes one document
///
/// Returns the top-level fields to set; an empty result means the document is
/// already normalized (or has nothing to normalize) and must not be written.
pub fn normalize_document(document: &Document, targets: &[FieldTarget]) -> Document {
    let mut set = Document::new();
    for target in targets {
        let key = target.container();
        let Some(current) = set.get(key).or_else(|| document.get(key)) else {
            continue;
        };
        if let Some(rewritten) = target.rewrite(current) {
            set.insert(key.to_string(), rewritten);
        }
    }
    set
}
