//! HTTP API handlers for catequesis-web

pub mod catechumens;
pub mod cycles;
pub mod enrollments;
pub mod error;
pub mod groups;
pub mod health;
pub mod levels;

pub use error::{ApiError, ApiResult};
pub use health::health_routes;
