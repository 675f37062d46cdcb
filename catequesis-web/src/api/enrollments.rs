//! Enrollment endpoints (`/api/inscripciones`)
//!
//! An enrollment is addressed by its catechumen and group ids.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use catequesis_common::models::{
    Enrollment, EnrollmentStatus, EnrollmentUpdate, NewAttendance, NewEnrollment, NewGrade,
};
use catequesis_common::records::enrollments;
use serde::Deserialize;

use crate::api::ApiResult;
use crate::pagination::{Page, PageQuery, PAGE_SIZE};
use crate::AppState;

/// Query parameters for enrollment search
#[derive(Debug, Deserialize)]
pub struct EnrollmentSearch {
    pub catequizando_id: Option<String>,
    pub grupo_id: Option<String>,
    pub estado: Option<EnrollmentStatus>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/inscripciones", get(list).post(create))
        .route("/api/inscripciones/buscar", get(search))
        .route(
            "/api/inscripciones/:catequizando_id/:grupo_id",
            get(get_one).put(update).delete(delete),
        )
        .route(
            "/api/inscripciones/:catequizando_id/:grupo_id/asistencia",
            post(record_attendance),
        )
        .route(
            "/api/inscripciones/:catequizando_id/:grupo_id/nota",
            post(record_grade),
        )
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Enrollment>>> {
    let total = enrollments::count(&state.store).await?;
    let pagination = query.pagination(total);
    let items = enrollments::list(&state.store, PAGE_SIZE, pagination.offset).await?;
    Ok(Json(Page::new(total, pagination, items)))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<EnrollmentSearch>,
) -> ApiResult<Json<Vec<Enrollment>>> {
    let found = enrollments::search(
        &state.store,
        query.catequizando_id.as_deref(),
        query.grupo_id.as_deref(),
        query.estado,
    )
    .await?;
    Ok(Json(found))
}

/// POST /api/inscripciones, 409 when the pair is already enrolled
pub async fn create(
    State(state): State<AppState>,
    Json(new_enrollment): Json<NewEnrollment>,
) -> ApiResult<(StatusCode, Json<Enrollment>)> {
    let enrollment = enrollments::create(&state.store, &new_enrollment).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path((catechumen_id, group_id)): Path<(String, String)>,
) -> ApiResult<Json<Enrollment>> {
    Ok(Json(enrollments::get(&state.store, &catechumen_id, &group_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path((catechumen_id, group_id)): Path<(String, String)>,
    Json(update): Json<EnrollmentUpdate>,
) -> ApiResult<Json<Enrollment>> {
    let enrollment = enrollments::update(&state.store, &catechumen_id, &group_id, &update).await?;
    Ok(Json(enrollment))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((catechumen_id, group_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    enrollments::delete(&state.store, &catechumen_id, &group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST .../asistencia, appends one attendance mark dated today
pub async fn record_attendance(
    State(state): State<AppState>,
    Path((catechumen_id, group_id)): Path<(String, String)>,
    Json(attendance): Json<NewAttendance>,
) -> ApiResult<Json<Enrollment>> {
    let enrollment =
        enrollments::record_attendance(&state.store, &catechumen_id, &group_id, attendance).await?;
    Ok(Json(enrollment))
}

/// POST .../nota, appends one grade dated today
pub async fn record_grade(
    State(state): State<AppState>,
    Path((catechumen_id, group_id)): Path<(String, String)>,
    Json(grade): Json<NewGrade>,
) -> ApiResult<Json<Enrollment>> {
    let enrollment = enrollments::record_grade(&state.store, &catechumen_id, &group_id, grade).await?;
    Ok(Json(enrollment))
}
