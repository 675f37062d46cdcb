//! Cycle endpoints (`/api/ciclos`)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catequesis_common::models::Cycle;
use catequesis_common::records::cycles;

use crate::api::ApiResult;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/ciclos", get(list).post(create))
        .route("/api/ciclos/:id", get(get_one).put(update).delete(delete))
}

/// GET /api/ciclos, newest cycle first
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Cycle>>> {
    Ok(Json(cycles::list(&state.store).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(cycle): Json<Cycle>,
) -> ApiResult<(StatusCode, Json<Cycle>)> {
    cycles::create(&state.store, &cycle).await?;
    Ok((StatusCode::CREATED, Json(cycle)))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Cycle>> {
    Ok(Json(cycles::get(&state.store, &id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(cycle): Json<Cycle>,
) -> ApiResult<Json<Cycle>> {
    Ok(Json(cycles::update(&state.store, &id, cycle).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    cycles::delete(&state.store, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
