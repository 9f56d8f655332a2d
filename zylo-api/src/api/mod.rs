//! HTTP API handlers for zylo-api

pub mod access;
pub mod admin;
pub mod assistant;
pub mod auth;
pub mod dj;
pub mod health;
pub mod mixes;
pub mod upload;

pub use access::{access_middleware, MaybePrincipal, Principal};
pub use admin::admin_routes;
pub use assistant::assistant_routes;
pub use auth::auth_routes;
pub use dj::dj_routes;
pub use health::health_routes;
pub use mixes::mix_routes;

use uuid::Uuid;

use crate::ApiError;

/// Parse a path id; malformed ids cannot exist, so they are `not_found`
pub(crate) fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::NotFound(not_found.to_string()))
}
