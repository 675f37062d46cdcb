//! Catechumen records (`catequizandos`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{ext_datetime, Collection};
use crate::models::{
    check_max_len, is_email, is_ten_digits, require_text, BaptismRecord, BloodType, HealthInfo,
    LegalGuardian, Parent, Record, SchoolYear, Schooling,
};
use crate::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

/// A person enrolled in the catechism program
///
/// `_id` is a natural key chosen at creation and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catechumen {
    #[serde(rename = "_id")]
    pub id: String,
    /// National id, 10 digits
    pub cedula: String,
    #[serde(rename = "primer_nombre")]
    pub first_name: String,
    #[serde(rename = "segundo_nombre", default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(rename = "primer_apellido")]
    pub first_surname: String,
    #[serde(rename = "segundo_apellido", default, skip_serializing_if = "Option::is_none")]
    pub second_surname: Option<String>,
    #[serde(rename = "genero")]
    pub gender: Gender,
    #[serde(rename = "fecha_nacimiento", with = "ext_datetime")]
    pub birth_date: DateTime<Utc>,
    #[serde(rename = "lugar_nacimiento", default, skip_serializing_if = "Option::is_none")]
    pub birthplace: Option<String>,
    #[serde(rename = "numero_hijo", default, skip_serializing_if = "Option::is_none")]
    pub child_number: Option<i64>,
    #[serde(rename = "numero_hermanos", default, skip_serializing_if = "Option::is_none")]
    pub sibling_count: Option<i64>,
    #[serde(rename = "telefono_casa", default, skip_serializing_if = "Option::is_none")]
    pub home_phone: Option<String>,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "padres", default)]
    pub parents: Vec<Parent>,
    #[serde(rename = "representante_legal")]
    pub legal_guardian: LegalGuardian,
    #[serde(rename = "informacion_salud", default)]
    pub health: HealthInfo,
    #[serde(rename = "fe_bautismo", default)]
    pub baptism: BaptismRecord,
    #[serde(rename = "sacramentos_realizados", default)]
    pub sacraments: Vec<String>,
    #[serde(rename = "escolaridad", default, skip_serializing_if = "Option::is_none")]
    pub schooling: Option<Schooling>,
    #[serde(rename = "observaciones_generales", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Catechumen {
    /// `cedula - SURNAME NAME`, as shown in listings
    pub fn display_name(&self) -> String {
        format!("{} - {} {}", self.cedula, self.first_surname, self.first_name)
    }
}

impl Record for Catechumen {
    const COLLECTION: Collection = Collection::Catequizandos;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        require_text(&mut errors, "_id", &self.id);
        check_max_len(&mut errors, "_id", &self.id, 50);
        if !is_ten_digits(&self.cedula) {
            errors.add("cedula", "The national id must have 10 numeric digits.");
        }
        require_text(&mut errors, "primer_nombre", &self.first_name);
        check_max_len(&mut errors, "primer_nombre", &self.first_name, 100);
        require_text(&mut errors, "primer_apellido", &self.first_surname);
        check_max_len(&mut errors, "primer_apellido", &self.first_surname, 100);
        require_text(&mut errors, "direccion", &self.address);
        check_max_len(&mut errors, "direccion", &self.address, 200);

        if let Some(phone) = &self.home_phone {
            check_max_len(&mut errors, "telefono_casa", phone, 20);
        }
        for (field, value) in [
            ("numero_hijo", self.child_number),
            ("numero_hermanos", self.sibling_count),
        ] {
            if matches!(value, Some(n) if n < 0) {
                errors.add(field, "Ensure this value is greater than or equal to 0.");
            }
        }

        for (i, parent) in self.parents.iter().enumerate() {
            errors.merge_prefixed(&format!("padres.{}", i), parent.validate());
        }
        errors.merge_prefixed("representante_legal", self.legal_guardian.validate());
        errors.merge_prefixed("fe_bautismo", self.baptism.validate());

        errors
    }
}

/// Short edit of a catechumen's contact and health details
///
/// Every field is optional; only the fields present are changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdate {
    /// Replaces `telefono_casa`
    pub telefono: Option<String>,
    /// Replaces the legal guardian's `correo`
    pub correo: Option<String>,
    /// Replaces `escolaridad.anio_en_curso`
    pub anio_en_curso: Option<SchoolYear>,
    /// Replaces `informacion_salud.tipo_sangre`
    pub tipo_sangre: Option<BloodType>,
    /// Added to `informacion_salud.alergias` when not already listed
    pub alergia: Option<String>,
    /// Replaces `observaciones_generales`
    pub comentario: Option<String>,
}

impl ContactUpdate {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(phone) = &self.telefono {
            if !is_ten_digits(phone) {
                errors.add("telefono", "Phone numbers have 10 digits.");
            }
        }
        if let Some(email) = &self.correo {
            if !is_email(email) {
                errors.add("correo", "Enter a valid email address.");
            }
        }
        if let Some(allergy) = &self.alergia {
            check_max_len(&mut errors, "alergia", allergy, 50);
        }
        if let Some(comment) = &self.comentario {
            check_max_len(&mut errors, "comentario", comment, 100);
        }
        errors
    }

    /// Apply to a record; returns the persisted top-level fields that changed
    pub fn apply(&self, catechumen: &mut Catechumen) -> Vec<&'static str> {
        let mut touched = Vec::new();

        if let Some(phone) = &self.telefono {
            catechumen.home_phone = Some(phone.clone());
            touched.push("telefono_casa");
        }
        if let Some(email) = &self.correo {
            catechumen.legal_guardian.email = Some(email.clone());
            touched.push("representante_legal");
        }
        if let Some(year) = self.anio_en_curso {
            catechumen
                .schooling
                .get_or_insert_with(Schooling::default)
                .school_year = Some(year);
            touched.push("escolaridad");
        }

        let mut health_changed = false;
        if let Some(blood_type) = self.tipo_sangre {
            catechumen.health.blood_type = Some(blood_type);
            health_changed = true;
        }
        if let Some(allergy) = self.alergia.as_deref().map(str::trim) {
            if !allergy.is_empty() && !catechumen.health.allergies.iter().any(|a| a == allergy) {
                catechumen.health.allergies.push(allergy.to_string());
                health_changed = true;
            }
        }
        if health_changed {
            touched.push("informacion_salud");
        }

        if let Some(comment) = &self.comentario {
            catechumen.notes = Some(comment.clone());
            touched.push("observaciones_generales");
        }

        touched
    }
}
