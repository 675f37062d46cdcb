//! Enrollments of a catechumen in a group (`inscripciones`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::RangeInclusive;

use crate::db::{ext_datetime, CalendarDate, Collection};
use crate::models::{check_max_len, require_text, Record};
use crate::FieldErrors;

/// Accepted grade values
pub const GRADE_RANGE: RangeInclusive<f64> = 0.0..=10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    #[default]
    #[serde(rename = "CURSANDO")]
    InProgress,
    #[serde(rename = "APROBADO")]
    Passed,
    #[serde(rename = "REPROBADO")]
    Failed,
    #[serde(rename = "RETIRADO")]
    Withdrawn,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::InProgress => "CURSANDO",
            EnrollmentStatus::Passed => "APROBADO",
            EnrollmentStatus::Failed => "REPROBADO",
            EnrollmentStatus::Withdrawn => "RETIRADO",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "PAGADO")]
    Paid,
    #[default]
    #[serde(rename = "PENDIENTE")]
    Pending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[default]
    #[serde(rename = "PRESENTE")]
    Present,
    #[serde(rename = "FALTA")]
    Absent,
    #[serde(rename = "JUSTIFICADA")]
    Excused,
}

/// Entry of `calificaciones`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "valor")]
    pub value: f64,
    #[serde(rename = "fecha")]
    pub date: CalendarDate,
}

/// Entry of `registro_asistencia`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    #[serde(rename = "sesion_id")]
    pub session_id: i64,
    #[serde(rename = "estado")]
    pub status: AttendanceStatus,
    #[serde(rename = "fecha", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<CalendarDate>,
}

/// `certificado_final`; fields beyond number and issue date are kept as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "numero_certificado")]
    pub number: String,
    #[serde(rename = "fecha_emision", default, skip_serializing_if = "Option::is_none")]
    pub issued_on: Option<CalendarDate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "catequizando_id")]
    pub catechumen_id: String,
    #[serde(rename = "grupo_id")]
    pub group_id: String,
    #[serde(rename = "fecha_inscripcion", with = "ext_datetime")]
    pub enrolled_at: DateTime<Utc>,
    #[serde(rename = "estado_inscripcion", default)]
    pub status: EnrollmentStatus,
    #[serde(rename = "estado_pago", default)]
    pub payment: PaymentStatus,
    #[serde(rename = "calificaciones", default)]
    pub grades: Vec<Grade>,
    #[serde(rename = "registro_asistencia", default)]
    pub attendance: Vec<AttendanceEntry>,
    #[serde(rename = "certificado_final", default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
}

impl Record for Enrollment {
    const COLLECTION: Collection = Collection::Inscripciones;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "catequizando_id", &self.catechumen_id);
        require_text(&mut errors, "grupo_id", &self.group_id);
        for (i, grade) in self.grades.iter().enumerate() {
            errors.merge_prefixed(
                &format!("calificaciones.{}", i),
                check_grade(&grade.description, grade.value),
            );
        }
        if let Some(certificate) = &self.certificate {
            require_text(&mut errors, "certificado_final.numero_certificado", &certificate.number);
        }
        errors
    }
}

fn check_grade(description: &str, value: f64) -> FieldErrors {
    let mut errors = FieldErrors::new();
    require_text(&mut errors, "descripcion", description);
    check_max_len(&mut errors, "descripcion", description, 100);
    if !GRADE_RANGE.contains(&value) {
        errors.add(
            "valor",
            format!(
                "The grade must be between {} and {}.",
                GRADE_RANGE.start(),
                GRADE_RANGE.end()
            ),
        );
    }
    errors
}

/// Input for enrolling a catechumen in a group
#[derive(Debug, Clone, Deserialize)]
pub struct NewEnrollment {
    pub catequizando_id: String,
    pub grupo_id: String,
    #[serde(default)]
    pub estado_pago: PaymentStatus,
}

impl NewEnrollment {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "catequizando_id", &self.catequizando_id);
        require_text(&mut errors, "grupo_id", &self.grupo_id);
        errors
    }
}

/// Edit of an enrollment's status and payment
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentUpdate {
    pub estado_inscripcion: EnrollmentStatus,
    pub estado_pago: PaymentStatus,
}

/// One attendance mark to append
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttendance {
    pub sesion_id: i64,
    #[serde(default)]
    pub estado: AttendanceStatus,
}

impl NewAttendance {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.sesion_id < 1 {
            errors.add("sesion_id", "Ensure this value is greater than or equal to 1.");
        }
        errors
    }

    /// Entry dated on the given day
    pub fn into_entry(self, date: CalendarDate) -> AttendanceEntry {
        AttendanceEntry {
            session_id: self.sesion_id,
            status: self.estado,
            date: Some(date),
        }
    }
}

/// One grade to append
#[derive(Debug, Clone, Deserialize)]
pub struct NewGrade {
    pub descripcion: String,
    pub valor: f64,
}

impl NewGrade {
    pub fn validate(&self) -> FieldErrors {
        check_grade(&self.descripcion, self.valor)
    }

    /// Grade dated on the given day
    pub fn into_grade(self, date: CalendarDate) -> Grade {
        Grade {
            description: self.descripcion,
            value: self.valor,
            date,
        }
    }
}
