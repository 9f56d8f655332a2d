//! zylo-api library interface
//!
//! REST backend for ZyloFM: accounts, DJ profiles, mixes, moderation and the
//! voice assistant library. Exposed as a library so integration tests can
//! drive the router directly.

pub mod api;
pub mod error;
pub mod media;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use zylo_common::auth::TokenIssuer;
use zylo_common::db::library::SqliteLibrary;
use zylo_common::library::LibraryRepository;

use crate::media::MediaStore;

/// Largest accepted request body (mix uploads carry audio + cover)
pub const MAX_BODY_BYTES: usize = 250 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Assistant library storage
    pub library: Arc<dyn LibraryRepository>,
    /// Access token signing and verification
    pub tokens: TokenIssuer,
    /// Media host for uploaded audio and images
    pub media: Arc<dyn MediaStore>,
    /// Whether ADMIN accounts may upload mixes
    pub allow_admin_upload: bool,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// State backed by SQLite for both relational data and the library
    pub fn new(
        db: SqlitePool,
        tokens: TokenIssuer,
        media: Arc<dyn MediaStore>,
        allow_admin_upload: bool,
    ) -> Self {
        Self {
            library: Arc::new(SqliteLibrary::new(db.clone())),
            db,
            tokens,
            media,
            allow_admin_upload,
            startup_time: Utc::now(),
        }
    }

    /// Replace the library repository
    pub fn with_library(mut self, library: Arc<dyn LibraryRepository>) -> Self {
        self.library = library;
        self
    }
}

/// Build application router
///
/// Every route passes through the access policy; routes without a policy
/// entry are admin-only.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::auth_routes())
        .merge(api::dj_routes())
        .merge(api::mix_routes())
        .merge(api::admin_routes())
        .merge(api::assistant_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::access_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
