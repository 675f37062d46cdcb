//! The date normalization run for the catechism store

use tracing::info;

use crate::db::{Collection, DocumentStore};
use crate::normalize::{normalize_collection, CollectionPlan, FieldTarget, NormalizeReport};
use crate::Result;

/// Every embedded date field that moved from a stored temporal to a string
pub fn date_fix_plan() -> Vec<CollectionPlan> {
    vec![
        CollectionPlan::new(
            Collection::Catequizandos,
            vec![FieldTarget::object("fe_bautismo", "fecha")],
        ),
        CollectionPlan::new(
            Collection::Inscripciones,
            vec![
                FieldTarget::array_elements("calificaciones", "fecha"),
                FieldTarget::object("certificado_final", "fecha_emision"),
                FieldTarget::array_elements("registro_asistencia", "fecha"),
            ],
        ),
        CollectionPlan::new(
            Collection::Grupos,
            vec![FieldTarget::array_elements("sesiones", "fecha")],
        ),
    ]
}

/// Normalize each planned collection in order
///
/// A collection that cannot be walked stops the run; per-document failures
/// only show up in that collection's report.
pub async fn run_plan(store: &DocumentStore, plan: &[CollectionPlan]) -> Result<Vec<NormalizeReport>> {
    let mut reports = Vec::with_capacity(plan.len());
    for collection_plan in plan {
        reports.push(normalize_collection(store, collection_plan).await?);
    }

    let modified: u64 = reports.iter().map(|r| r.modified).sum();
    info!("Date normalization complete: {} document(s) modified", modified);
    Ok(reports)
}
