//! Enrollment operations
//!
//! Enrollments are addressed by their (catechumen, group) pair, which the
//! store keeps unique.

use chrono::SubsecRound;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::db::{from_document, to_document, CalendarDate, Collection, DocumentStore, Filter};
use crate::models::{
    Enrollment, EnrollmentStatus, EnrollmentUpdate, Group, GroupStatus, NewAttendance,
    NewEnrollment, NewGrade, Record,
};
use crate::records::{find_record, find_records, list_records, search_term, select_fields};
use crate::{time, Error, FieldErrors, Result};

/// Enroll an existing catechumen in an active group
pub async fn create(store: &DocumentStore, new_enrollment: &NewEnrollment) -> Result<Enrollment> {
    new_enrollment.validate().into_result()?;

    let mut errors = FieldErrors::new();
    if !store
        .exists(Collection::Catequizandos, &new_enrollment.catequizando_id)
        .await?
    {
        errors.add("catequizando_id", "Select a valid catechumen.");
    }
    match find_record::<Group>(store, &new_enrollment.grupo_id).await? {
        Some(group) if group.status == GroupStatus::Active => {}
        Some(_) => errors.add("grupo_id", "The group is not active."),
        None => errors.add("grupo_id", "Select a valid group."),
    }
    errors.into_result()?;

    let enrollment = Enrollment {
        id: Uuid::new_v4().simple().to_string(),
        catechumen_id: new_enrollment.catequizando_id.clone(),
        group_id: new_enrollment.grupo_id.clone(),
        // Stored with millisecond precision
        enrolled_at: time::now().trunc_subsecs(3),
        status: EnrollmentStatus::default(),
        payment: new_enrollment.estado_pago,
        grades: Vec::new(),
        attendance: Vec::new(),
        certificate: None,
    };
    enrollment.validate().into_result()?;

    store
        .insert(Enrollment::COLLECTION, to_document(&enrollment)?)
        .await
        .map_err(|e| match e {
            Error::Duplicate(_) => Error::Duplicate(format!(
                "Catechumen {} is already enrolled in group {}",
                enrollment.catechumen_id, enrollment.group_id
            )),
            other => other,
        })?;

    info!(
        "Enrolled catechumen {} in group {}",
        enrollment.catechumen_id, enrollment.group_id
    );
    Ok(enrollment)
}

/// Enrollment of a catechumen in a group, `NotFound` when absent
pub async fn get(store: &DocumentStore, catechumen_id: &str, group_id: &str) -> Result<Enrollment> {
    let filter = pair_filter(catechumen_id, group_id);
    store
        .find_where(Enrollment::COLLECTION, &filter)
        .await?
        .into_iter()
        .next()
        .map(from_document)
        .transpose()?
        .ok_or_else(|| {
            Error::NotFound(format!(
                "enrollment of {} in group {}",
                catechumen_id, group_id
            ))
        })
}

pub async fn list(store: &DocumentStore, limit: i64, offset: i64) -> Result<Vec<Enrollment>> {
    list_records(store, limit, offset).await
}

pub async fn count(store: &DocumentStore) -> Result<i64> {
    store.count(Enrollment::COLLECTION).await
}

/// Search by catechumen, group and status
pub async fn search(
    store: &DocumentStore,
    catechumen_id: Option<&str>,
    group_id: Option<&str>,
    status: Option<EnrollmentStatus>,
) -> Result<Vec<Enrollment>> {
    let mut filter = Filter::new();
    if let Some(catechumen_id) = search_term(catechumen_id) {
        filter = filter.eq("catequizando_id", catechumen_id);
    }
    if let Some(group_id) = search_term(group_id) {
        filter = filter.eq("grupo_id", group_id);
    }
    if let Some(status) = status {
        filter = filter.eq("estado_inscripcion", status.as_str());
    }
    find_records(store, &filter).await
}

/// Change enrollment status and payment status
pub async fn update(
    store: &DocumentStore,
    catechumen_id: &str,
    group_id: &str,
    update: &EnrollmentUpdate,
) -> Result<Enrollment> {
    let mut enrollment = get(store, catechumen_id, group_id).await?;
    enrollment.status = update.estado_inscripcion;
    enrollment.payment = update.estado_pago;

    let set = select_fields(&enrollment, &["estado_inscripcion", "estado_pago"])?;
    store
        .update_fields(Enrollment::COLLECTION, &enrollment.id, set)
        .await?;
    Ok(enrollment)
}

pub async fn delete(store: &DocumentStore, catechumen_id: &str, group_id: &str) -> Result<()> {
    let enrollment = get(store, catechumen_id, group_id).await?;
    store.delete(Enrollment::COLLECTION, &enrollment.id).await?;
    info!(
        "Removed enrollment of catechumen {} from group {}",
        catechumen_id, group_id
    );
    Ok(())
}

/// Append one attendance mark dated today; earlier marks are kept
pub async fn record_attendance(
    store: &DocumentStore,
    catechumen_id: &str,
    group_id: &str,
    attendance: NewAttendance,
) -> Result<Enrollment> {
    attendance.validate().into_result()?;
    let enrollment = get(store, catechumen_id, group_id).await?;

    let entry = attendance.into_entry(CalendarDate::today());
    append(store, &enrollment, "registro_asistencia", serde_json::to_value(entry)?).await?;
    get(store, catechumen_id, group_id).await
}

/// Append one grade dated today; earlier grades are kept
pub async fn record_grade(
    store: &DocumentStore,
    catechumen_id: &str,
    group_id: &str,
    grade: NewGrade,
) -> Result<Enrollment> {
    grade.validate().into_result()?;
    let enrollment = get(store, catechumen_id, group_id).await?;

    let grade = grade.into_grade(CalendarDate::today());
    append(store, &enrollment, "calificaciones", serde_json::to_value(grade)?).await?;
    get(store, catechumen_id, group_id).await
}

async fn append(store: &DocumentStore, enrollment: &Enrollment, field: &str, value: Value) -> Result<()> {
    store
        .push(Enrollment::COLLECTION, &enrollment.id, field, value)
        .await
}

fn pair_filter(catechumen_id: &str, group_id: &str) -> Filter {
    Filter::new()
        .eq("catequizando_id", catechumen_id)
        .eq("grupo_id", group_id)
}
