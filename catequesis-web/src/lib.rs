//! catequesis-web library - record service for the catechism program
//!
//! JSON endpoints over the five collections: catechumens, levels, cycles,
//! groups and enrollments.

use axum::Router;
use catequesis_common::db::DocumentStore;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
}

impl AppState {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::catechumens::routes())
        .merge(api::levels::routes())
        .merge(api::cycles::routes())
        .merge(api::groups::routes())
        .merge(api::enrollments::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
