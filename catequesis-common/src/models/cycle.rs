//! Program cycles (`ciclos`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{ext_datetime, Collection};
use crate::models::{check_max_len, require_text, Record};
use crate::FieldErrors;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleStatus {
    #[serde(rename = "ABIERTO")]
    Open,
    #[serde(rename = "CERRADO")]
    Closed,
    #[default]
    #[serde(rename = "INSCRIPCIONES")]
    Enrolling,
}

/// A program year with its enrollment state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fecha_inicio", with = "ext_datetime")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "fecha_fin", with = "ext_datetime")]
    pub ends_at: DateTime<Utc>,
    #[serde(rename = "estado", default)]
    pub status: CycleStatus,
}

impl Record for Cycle {
    const COLLECTION: Collection = Collection::Ciclos;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "_id", &self.id);
        require_text(&mut errors, "nombre", &self.name);
        check_max_len(&mut errors, "nombre", &self.name, 100);
        if self.starts_at >= self.ends_at {
            errors.add("fecha_fin", "The end date must be after the start date.");
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_end_must_follow_start() {
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();
        let mut cycle = Cycle {
            id: "2024".to_string(),
            name: "Ciclo 2024-2025".to_string(),
            starts_at: start,
            ends_at: start,
            status: CycleStatus::default(),
        };
        assert!(cycle.validate().contains("fecha_fin"));

        cycle.ends_at = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
        assert!(cycle.validate().is_empty());
    }

    #[test]
    fn test_status_defaults_to_enrolling() {
        let cycle: Cycle = serde_json::from_value(json!({
            "_id": "2024",
            "nombre": "Ciclo 2024-2025",
            "fecha_inicio": "2024-09-01",
            "fecha_fin": "2025-06-30"
        }))
        .unwrap();
        assert_eq!(cycle.status, CycleStatus::Enrolling);
        assert_eq!(serde_json::to_value(cycle.status).unwrap(), json!("INSCRIPCIONES"));
    }
}
