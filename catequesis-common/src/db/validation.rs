//! Collection validators and validation levels
//!
//! Each collection carries a validator (required top-level fields plus declared
//! types per dotted path) and a validation level deciding when it is enforced:
//!
//! - `strict`: every insert and update is validated
//! - `moderate`: inserts are validated; an update is validated only when the
//!   document it modifies already passes
//! - `off`: nothing is validated
//!
//! The level is mutable state on the store, changed with
//! [`DocumentStore::set_validation_level`](crate::db::DocumentStore::set_validation_level).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::db::document::{values_at_path, Document};
use crate::db::temporal::is_temporal;
use crate::{Error, FieldErrors, Result};

/// When a collection's validator is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Strict,
    Moderate,
    Off,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::Strict => "strict",
            ValidationLevel::Moderate => "moderate",
            ValidationLevel::Off => "off",
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(ValidationLevel::Strict),
            "moderate" => Ok(ValidationLevel::Moderate),
            "off" => Ok(ValidationLevel::Off),
            other => Err(Error::InvalidInput(format!("Unknown validation level: {}", other))),
        }
    }
}

/// Value types a validator rule can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BsonType {
    String,
    Date,
    Int,
    Double,
    /// Either integer or floating point
    Number,
    Bool,
    Object,
    Array,
    Null,
}

impl BsonType {
    /// Whether a stored value has this type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            BsonType::String => value.is_string(),
            BsonType::Date => is_temporal(value),
            BsonType::Int => value.is_i64() || value.is_u64(),
            BsonType::Double => value.is_f64(),
            BsonType::Number => value.is_number(),
            BsonType::Bool => value.is_boolean(),
            BsonType::Object => value.is_object() && !is_temporal(value),
            BsonType::Array => value.is_array(),
            BsonType::Null => value.is_null(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BsonType::String => "string",
            BsonType::Date => "date",
            BsonType::Int => "int",
            BsonType::Double => "double",
            BsonType::Number => "number",
            BsonType::Bool => "bool",
            BsonType::Object => "object",
            BsonType::Array => "array",
            BsonType::Null => "null",
        }
    }
}

/// Declared types for one dotted path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub path: String,
    pub types: Vec<BsonType>,
}

impl FieldRule {
    pub fn new(path: impl Into<String>, bson_type: BsonType) -> Self {
        Self {
            path: path.into(),
            types: vec![bson_type],
        }
    }

    /// Also accept `null` for this path
    pub fn nullable(mut self) -> Self {
        if !self.types.contains(&BsonType::Null) {
            self.types.push(BsonType::Null);
        }
        self
    }

    fn describe_types(&self) -> String {
        self.types
            .iter()
            .map(BsonType::as_str)
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

/// A collection validator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub rules: Vec<FieldRule>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, fields: &[&str]) -> Self {
        self.required.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Declared rule for a path
    pub fn rule_for(&self, path: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.path == path)
    }

    /// Declare a single type for a path, replacing any existing rule
    ///
    /// An existing `null` allowance is kept.
    pub fn set_field_type(&mut self, path: &str, bson_type: BsonType) {
        match self.rules.iter_mut().find(|r| r.path == path) {
            Some(rule) => {
                let nullable = rule.types.contains(&BsonType::Null);
                rule.types = vec![bson_type];
                if nullable && bson_type != BsonType::Null {
                    rule.types.push(BsonType::Null);
                }
            }
            None => self.rules.push(FieldRule::new(path, bson_type)),
        }
    }

    /// Check a document; absent optional values always pass
    pub fn validate(&self, document: &Document) -> FieldErrors {
        let mut errors = FieldErrors::new();

        for field in &self.required {
            if !document.contains_key(field) {
                errors.add(field.clone(), "required field is missing");
            }
        }

        for rule in &self.rules {
            for value in values_at_path(document, &rule.path) {
                if !rule.types.iter().any(|t| t.matches(value)) {
                    errors.add(
                        rule.path.clone(),
                        format!("expected {}, got {}", rule.describe_types(), value_kind(value)),
                    );
                }
            }
        }

        errors
    }
}

fn value_kind(value: &Value) -> &'static str {
    if is_temporal(value) {
        return "date";
    }
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
