//! Catechumen endpoints (`/api/catequizandos`)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catequesis_common::models::{Catechumen, ContactUpdate};
use catequesis_common::records::catechumens;
use serde::Deserialize;

use crate::api::ApiResult;
use crate::pagination::{Page, PageQuery, PAGE_SIZE};
use crate::AppState;

/// Query parameters for catechumen search
#[derive(Debug, Deserialize)]
pub struct CatechumenSearch {
    /// National id prefix
    pub cedula: Option<String>,
    /// Fragment of the first surname
    pub apellido: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/catequizandos", get(list).post(create))
        .route("/api/catequizandos/buscar", get(search))
        .route(
            "/api/catequizandos/:id",
            get(get_one).put(update).patch(update_contact).delete(delete),
        )
}

/// GET /api/catequizandos?page=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Catechumen>>> {
    let total = catechumens::count(&state.store).await?;
    let pagination = query.pagination(total);
    let items = catechumens::list(&state.store, PAGE_SIZE, pagination.offset).await?;
    Ok(Json(Page::new(total, pagination, items)))
}

/// GET /api/catequizandos/buscar?cedula=&apellido=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<CatechumenSearch>,
) -> ApiResult<Json<Vec<Catechumen>>> {
    let found = catechumens::search(
        &state.store,
        query.cedula.as_deref(),
        query.apellido.as_deref(),
    )
    .await?;
    Ok(Json(found))
}

/// POST /api/catequizandos
pub async fn create(
    State(state): State<AppState>,
    Json(catechumen): Json<Catechumen>,
) -> ApiResult<(StatusCode, Json<Catechumen>)> {
    catechumens::create(&state.store, &catechumen).await?;
    Ok((StatusCode::CREATED, Json(catechumen)))
}

/// GET /api/catequizandos/:id
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Catechumen>> {
    Ok(Json(catechumens::get(&state.store, &id).await?))
}

/// PUT /api/catequizandos/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(catechumen): Json<Catechumen>,
) -> ApiResult<Json<Catechumen>> {
    Ok(Json(catechumens::update(&state.store, &id, catechumen).await?))
}

/// PATCH /api/catequizandos/:id
///
/// Short edit of phone, email, school year, blood type, allergy and comment.
pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ContactUpdate>,
) -> ApiResult<Json<Catechumen>> {
    Ok(Json(catechumens::update_contact(&state.store, &id, &update).await?))
}

/// DELETE /api/catequizandos/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    catechumens::delete(&state.store, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
