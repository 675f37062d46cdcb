//! Sub-documents embedded in a catechumen record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::CalendarDate;
use crate::models::{check_max_len, is_email, is_ten_digits, require_text};
use crate::FieldErrors;

/// Entry of `padres`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parent {
    /// e.g. `PADRE`, `MADRE`
    #[serde(rename = "relacion")]
    pub relationship: String,
    #[serde(rename = "nombres")]
    pub given_names: String,
    #[serde(rename = "apellidos")]
    pub surnames: String,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "ocupacion", default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    /// Keys this model does not know about, kept as stored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Parent {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "relacion", &self.relationship);
        require_text(&mut errors, "nombres", &self.given_names);
        require_text(&mut errors, "apellidos", &self.surnames);
        if let Some(phone) = &self.phone {
            if !is_ten_digits(phone) {
                errors.add("telefono", "Phone numbers have 10 digits.");
            }
        }
        if let Some(occupation) = &self.occupation {
            check_max_len(&mut errors, "ocupacion", occupation, 100);
        }
        errors
    }
}

/// `representante_legal`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegalGuardian {
    #[serde(rename = "es_uno_de_los_padres", default)]
    pub is_parent: bool,
    #[serde(rename = "nombres")]
    pub given_names: String,
    #[serde(rename = "apellidos")]
    pub surnames: String,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "correo", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Keys this model does not know about, kept as stored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LegalGuardian {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "nombres", &self.given_names);
        require_text(&mut errors, "apellidos", &self.surnames);
        if let Some(phone) = &self.phone {
            if !is_ten_digits(phone) {
                errors.add("telefono", "Phone numbers have 10 digits.");
            }
        }
        if let Some(email) = &self.email {
            if !is_email(email) {
                errors.add("correo", "Enter a valid email address.");
            }
        }
        errors
    }
}

/// Blood type stored in `informacion_salud.tipo_sangre`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
}

/// `informacion_salud.contacto_emergencia`: free text or a contact object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmergencyContact {
    Text(String),
    Details(Map<String, Value>),
}

/// `informacion_salud`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthInfo {
    #[serde(rename = "tipo_sangre", default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<BloodType>,
    #[serde(rename = "alergias", default)]
    pub allergies: Vec<String>,
    #[serde(rename = "contacto_emergencia", default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
    /// Keys this model does not know about, kept as stored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `fe_bautismo`
///
/// `fecha` is a `YYYY-MM-DD` string; older documents may still hold a stored
/// temporal there until the date normalization has run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaptismRecord {
    #[serde(rename = "fecha", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<CalendarDate>,
    #[serde(rename = "parroquia", default, skip_serializing_if = "Option::is_none")]
    pub parish: Option<String>,
    #[serde(rename = "ciudad", default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "tomo", default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
    #[serde(rename = "pagina", default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Keys this model does not know about, kept as stored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BaptismRecord {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if matches!(self.volume, Some(v) if v < 1) {
            errors.add("tomo", "Ensure this value is greater than or equal to 1.");
        }
        if matches!(self.page, Some(p) if p < 1) {
            errors.add("pagina", "Ensure this value is greater than or equal to 1.");
        }
        errors
    }
}

/// School year stored in `escolaridad.anio_en_curso`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchoolYear {
    #[serde(rename = "1RO")]
    First,
    #[serde(rename = "2DO")]
    Second,
    #[serde(rename = "3RO")]
    Third,
    #[serde(rename = "4TO")]
    Fourth,
    #[serde(rename = "5TO")]
    Fifth,
    #[serde(rename = "6TO")]
    Sixth,
    #[serde(rename = "7MO")]
    Seventh,
    #[serde(rename = "8VO")]
    Eighth,
    #[serde(rename = "9NO")]
    Ninth,
    #[serde(rename = "10MO")]
    Tenth,
    #[serde(rename = "1BGU")]
    FirstBachillerato,
    #[serde(rename = "2BGU")]
    SecondBachillerato,
    #[serde(rename = "3BGU")]
    ThirdBachillerato,
}

/// `escolaridad`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schooling {
    #[serde(rename = "escuela", default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(rename = "anio_en_curso", default, skip_serializing_if = "Option::is_none")]
    pub school_year: Option<SchoolYear>,
    /// Keys this model does not know about, kept as stored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blood_type_and_school_year_wire_names() {
        assert_eq!(serde_json::to_value(BloodType::AbNegative).unwrap(), json!("AB-"));
        assert_eq!(serde_json::to_value(SchoolYear::Tenth).unwrap(), json!("10MO"));
        assert!(serde_json::from_value::<BloodType>(json!("C+")).is_err());
    }

    #[test]
    fn test_baptism_reads_legacy_temporal_date() {
        let record: BaptismRecord = serde_json::from_value(json!({
            "fecha": {"$date": "2015-06-12T00:00:00Z"},
            "parroquia": "San José"
        }))
        .unwrap();

        let written = serde_json::to_value(&record).unwrap();
        assert_eq!(written, json!({"fecha": "2015-06-12", "parroquia": "San José"}));
    }

    #[test]
    fn test_guardian_contact_checks() {
        let guardian = LegalGuardian {
            is_parent: true,
            given_names: "María".to_string(),
            surnames: "Pérez".to_string(),
            phone: Some("09123".to_string()),
            email: Some("maria".to_string()),
            ..Default::default()
        };
        let errors = guardian.validate();
        assert!(errors.contains("telefono"));
        assert!(errors.contains("correo"));
    }
}
