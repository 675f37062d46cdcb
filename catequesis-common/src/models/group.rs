//! Catechism groups (`grupos`)

use serde::{Deserialize, Serialize};

use crate::db::{CalendarDate, Collection};
use crate::models::{check_max_len, require_text, Record};
use crate::FieldErrors;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupStatus {
    #[default]
    #[serde(rename = "ACTIVO")]
    Active,
    #[serde(rename = "INACTIVO")]
    Inactive,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Active => "ACTIVO",
            GroupStatus::Inactive => "INACTIVO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatechistRole {
    #[serde(rename = "TITULAR")]
    Lead,
    #[serde(rename = "AUXILIAR")]
    Assistant,
}

/// Entry of `catequistas`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catechist {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo")]
    pub role: CatechistRole,
}

/// Entry of `sesiones`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "sesion_id")]
    pub session_id: i64,
    #[serde(rename = "tema", default)]
    pub topic: String,
    #[serde(rename = "fecha", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<CalendarDate>,
    #[serde(rename = "asistencia_tomada", default)]
    pub attendance_taken: bool,
}

/// A class of catechumens for one level within one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "nombre_grupo")]
    pub name: String,
    #[serde(rename = "ciclo_id")]
    pub cycle_id: String,
    #[serde(rename = "nivel_id")]
    pub level_id: String,
    #[serde(rename = "estado", default)]
    pub status: GroupStatus,
    #[serde(rename = "catequistas", default)]
    pub catechists: Vec<Catechist>,
    #[serde(rename = "sesiones", default)]
    pub sessions: Vec<Session>,
}

impl Record for Group {
    const COLLECTION: Collection = Collection::Grupos;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "_id", &self.id);
        require_text(&mut errors, "nombre_grupo", &self.name);
        check_max_len(&mut errors, "nombre_grupo", &self.name, 50);
        require_text(&mut errors, "ciclo_id", &self.cycle_id);
        require_text(&mut errors, "nivel_id", &self.level_id);

        for (i, catechist) in self.catechists.iter().enumerate() {
            require_text(&mut errors, &format!("catequistas.{}.nombre", i), &catechist.name);
        }
        let mut seen = Vec::with_capacity(self.sessions.len());
        for (i, session) in self.sessions.iter().enumerate() {
            if seen.contains(&session.session_id) {
                errors.add(format!("sesiones.{}.sesion_id", i), "Duplicate session number.");
            }
            seen.push(session.session_id);
        }
        errors
    }
}

/// Input for creating a group; `_id` is generated when omitted
#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub nombre_grupo: String,
    pub ciclo_id: String,
    pub nivel_id: String,
    #[serde(default)]
    pub estado: GroupStatus,
    #[serde(default)]
    pub catequistas: Vec<Catechist>,
    #[serde(default)]
    pub sesiones: Vec<Session>,
}

impl NewGroup {
    pub fn into_group(self, id: String) -> Group {
        Group {
            id,
            name: self.nombre_grupo,
            cycle_id: self.ciclo_id,
            level_id: self.nivel_id,
            status: self.estado,
            catechists: self.catequistas,
            sessions: self.sesiones,
        }
    }
}

/// Edit of a group: name and status only
#[derive(Debug, Clone, Deserialize)]
pub struct GroupUpdate {
    pub nombre_grupo: String,
    pub estado: GroupStatus,
}

impl GroupUpdate {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "nombre_grupo", &self.nombre_grupo);
        check_max_len(&mut errors, "nombre_grupo", &self.nombre_grupo, 50);
        errors
    }
}
