//! Level endpoints (`/api/niveles`)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catequesis_common::models::Level;
use catequesis_common::records::levels;

use crate::api::ApiResult;
use crate::pagination::{Page, PageQuery, PAGE_SIZE};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/niveles", get(list).post(create))
        .route("/api/niveles/:id", get(get_one).put(update).delete(delete))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Level>>> {
    let total = levels::count(&state.store).await?;
    let pagination = query.pagination(total);
    let items = levels::list(&state.store, PAGE_SIZE, pagination.offset).await?;
    Ok(Json(Page::new(total, pagination, items)))
}

pub async fn create(
    State(state): State<AppState>,
    Json(level): Json<Level>,
) -> ApiResult<(StatusCode, Json<Level>)> {
    levels::create(&state.store, &level).await?;
    Ok((StatusCode::CREATED, Json(level)))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Level>> {
    Ok(Json(levels::get(&state.store, &id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(level): Json<Level>,
) -> ApiResult<Json<Level>> {
    Ok(Json(levels::update(&state.store, &id, level).await?))
}

/// Refused with 409 while a group still uses the level
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    levels::delete(&state.store, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
