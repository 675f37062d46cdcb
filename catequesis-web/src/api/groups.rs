//! Group endpoints (`/api/grupos`)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catequesis_common::models::{Group, GroupStatus, GroupUpdate, NewGroup};
use catequesis_common::records::groups;
use serde::Deserialize;

use crate::api::ApiResult;
use crate::pagination::{Page, PageQuery, PAGE_SIZE};
use crate::AppState;

/// Query parameters for group search
#[derive(Debug, Deserialize)]
pub struct GroupSearch {
    pub nombre: Option<String>,
    pub estado: Option<GroupStatus>,
    pub ciclo_id: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/grupos", get(list).post(create))
        .route("/api/grupos/buscar", get(search))
        .route("/api/grupos/:id", get(get_one).put(update).delete(delete))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Group>>> {
    let total = groups::count(&state.store).await?;
    let pagination = query.pagination(total);
    let items = groups::list(&state.store, PAGE_SIZE, pagination.offset).await?;
    Ok(Json(Page::new(total, pagination, items)))
}

/// GET /api/grupos/buscar?nombre=&estado=&ciclo_id=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<GroupSearch>,
) -> ApiResult<Json<Vec<Group>>> {
    let found = groups::search(
        &state.store,
        query.nombre.as_deref(),
        query.estado,
        query.ciclo_id.as_deref(),
    )
    .await?;
    Ok(Json(found))
}

pub async fn create(
    State(state): State<AppState>,
    Json(new_group): Json<NewGroup>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    let group = groups::create(&state.store, new_group).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Group>> {
    Ok(Json(groups::get(&state.store, &id).await?))
}

/// PUT /api/grupos/:id, changes name and status only
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<GroupUpdate>,
) -> ApiResult<Json<Group>> {
    Ok(Json(groups::update(&state.store, &id, &update).await?))
}

/// DELETE /api/grupos/:id, enrollments in the group go with it
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    groups::delete(&state.store, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
