//! Catechism levels (`niveles`)

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::db::Collection;
use crate::models::{check_max_len, require_text, Record};
use crate::FieldErrors;

/// Accepted `edad_minima` values
pub const MINIMUM_AGE_RANGE: RangeInclusive<i64> = 5..=18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "libro_asignado")]
    pub assigned_book: String,
    #[serde(rename = "edad_minima")]
    pub minimum_age: i64,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "sacramento_asociado", default, skip_serializing_if = "Option::is_none")]
    pub sacrament: Option<String>,
}

impl Record for Level {
    const COLLECTION: Collection = Collection::Niveles;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "_id", &self.id);
        require_text(&mut errors, "nombre", &self.name);
        check_max_len(&mut errors, "nombre", &self.name, 100);
        require_text(&mut errors, "libro_asignado", &self.assigned_book);
        check_max_len(&mut errors, "libro_asignado", &self.assigned_book, 200);

        if self.minimum_age < *MINIMUM_AGE_RANGE.start() {
            errors.add(
                "edad_minima",
                format!("The minimum age cannot be lower than {}.", MINIMUM_AGE_RANGE.start()),
            );
        } else if self.minimum_age > *MINIMUM_AGE_RANGE.end() {
            errors.add(
                "edad_minima",
                format!("The minimum age cannot be higher than {}.", MINIMUM_AGE_RANGE.end()),
            );
        }
        if let Some(sacrament) = &self.sacrament {
            check_max_len(&mut errors, "sacramento_asociado", sacrament, 100);
        }
        errors
    }
}
