//! Health check endpoint
//!
//! Reports the document count of every collection; a store that cannot answer
//! turns the check into a 503.

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use catequesis_common::db::Collection;
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// `ok`, or the store error
    pub database: String,
    /// Documents per collection, empty when the store is down
    pub collections: BTreeMap<&'static str, i64>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut collections = BTreeMap::new();
    let mut database = "ok".to_string();

    for collection in Collection::ALL {
        match state.store.count(collection).await {
            Ok(count) => {
                collections.insert(collection.name(), count);
            }
            Err(e) => {
                warn!("Health check could not count {}: {}", collection, e);
                database = e.to_string();
                collections.clear();
                break;
            }
        }
    }

    let (code, status) = if collections.is_empty() {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    } else {
        (StatusCode::OK, "ok")
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            module: "catequesis-web".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
            collections,
        }),
    )
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
