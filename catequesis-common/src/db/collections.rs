//! Collection definitions
//!
//! Single source of truth for the five collections: their names, the validator
//! installed when a collection is first created, and store-level unique indexes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::validation::{BsonType, FieldRule, Validator};
use crate::Error;

/// A collection in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Catequizandos,
    Niveles,
    Ciclos,
    Grupos,
    Inscripciones,
}

/// Unique index over one or more top-level fields
#[derive(Debug, Clone, Copy)]
pub struct UniqueIndex {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

static INSCRIPCION_INDEXES: [UniqueIndex; 1] = [UniqueIndex {
    name: "unique_inscripcion_alumno_grupo",
    fields: &["catequizando_id", "grupo_id"],
}];

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Catequizandos,
        Collection::Niveles,
        Collection::Ciclos,
        Collection::Grupos,
        Collection::Inscripciones,
    ];

    /// Collection (and backing table) name
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Catequizandos => "catequizandos",
            Collection::Niveles => "niveles",
            Collection::Ciclos => "ciclos",
            Collection::Grupos => "grupos",
            Collection::Inscripciones => "inscripciones",
        }
    }

    /// Unique indexes enforced by the store
    pub fn unique_indexes(&self) -> &'static [UniqueIndex] {
        match self {
            Collection::Inscripciones => &INSCRIPCION_INDEXES,
            _ => &[],
        }
    }

    /// Validator installed when the collection is created
    ///
    /// Embedded dates (baptism, grades, sessions, attendance, certificate) are
    /// declared as strings; top-level timestamps stay temporal.
    pub fn default_validator(&self) -> Validator {
        match self {
            Collection::Catequizandos => Validator::new()
                .require(&[
                    "_id",
                    "cedula",
                    "primer_nombre",
                    "primer_apellido",
                    "genero",
                    "fecha_nacimiento",
                    "direccion",
                ])
                .rule(FieldRule::new("cedula", BsonType::String))
                .rule(FieldRule::new("genero", BsonType::String))
                .rule(FieldRule::new("fecha_nacimiento", BsonType::Date))
                .rule(FieldRule::new("padres", BsonType::Array))
                .rule(FieldRule::new("representante_legal", BsonType::Object))
                .rule(FieldRule::new("informacion_salud", BsonType::Object))
                .rule(FieldRule::new("fe_bautismo", BsonType::Object))
                .rule(FieldRule::new("fe_bautismo.fecha", BsonType::String).nullable())
                .rule(FieldRule::new("escolaridad", BsonType::Object).nullable()),
            Collection::Niveles => Validator::new()
                .require(&["_id", "nombre", "libro_asignado", "edad_minima"])
                .rule(FieldRule::new("nombre", BsonType::String))
                .rule(FieldRule::new("libro_asignado", BsonType::String))
                .rule(FieldRule::new("edad_minima", BsonType::Int)),
            Collection::Ciclos => Validator::new()
                .require(&["_id", "nombre", "fecha_inicio", "fecha_fin", "estado"])
                .rule(FieldRule::new("fecha_inicio", BsonType::Date))
                .rule(FieldRule::new("fecha_fin", BsonType::Date))
                .rule(FieldRule::new("estado", BsonType::String)),
            Collection::Grupos => Validator::new()
                .require(&["_id", "nombre_grupo", "ciclo_id", "nivel_id", "estado"])
                .rule(FieldRule::new("ciclo_id", BsonType::String))
                .rule(FieldRule::new("nivel_id", BsonType::String))
                .rule(FieldRule::new("catequistas", BsonType::Array))
                .rule(FieldRule::new("sesiones", BsonType::Array))
                .rule(FieldRule::new("sesiones.fecha", BsonType::String).nullable()),
            Collection::Inscripciones => Validator::new()
                .require(&[
                    "_id",
                    "catequizando_id",
                    "grupo_id",
                    "fecha_inscripcion",
                    "estado_inscripcion",
                    "estado_pago",
                ])
                .rule(FieldRule::new("fecha_inscripcion", BsonType::Date))
                .rule(FieldRule::new("calificaciones", BsonType::Array))
                .rule(FieldRule::new("calificaciones.valor", BsonType::Number))
                .rule(FieldRule::new("calificaciones.fecha", BsonType::String))
                .rule(FieldRule::new("registro_asistencia", BsonType::Array))
                .rule(FieldRule::new("registro_asistencia.fecha", BsonType::String).nullable())
                .rule(FieldRule::new("certificado_final", BsonType::Object).nullable())
                .rule(FieldRule::new("certificado_final.fecha_emision", BsonType::String).nullable()),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::NotFound(format!("collection {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for collection in Collection::ALL {
            assert_eq!(collection.name().parse::<Collection>().unwrap(), collection);
        }
        assert!("parroquias".parse::<Collection>().is_err());
    }

    #[test]
    fn test_only_inscripciones_has_unique_pair() {
        let indexes = Collection::Inscripciones.unique_indexes();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].fields, &["catequizando_id", "grupo_id"]);
        assert!(Collection::Grupos.unique_indexes().is_empty());
    }

    #[test]
    fn test_embedded_dates_declared_as_strings() {
        let validator = Collection::Inscripciones.default_validator();
        let rule = validator.rule_for("calificaciones.fecha").unwrap();
        assert_eq!(rule.types, vec![BsonType::String]);
    }
}
