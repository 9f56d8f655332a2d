//! Moderation endpoints (ADMIN only)

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use zylo_common::db::djs::{list_djs_with_user, set_dj_status};
use zylo_common::db::mixes::{list_mixes_by_status, set_mix_status};
use zylo_common::models::{DjProfile, DjProfileWithUser, MixView};
use zylo_common::{DjStatus, MixStatus};

use crate::api::parse_id;
use crate::{ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct DjListQuery {
    /// `pending`, `approved` or `blocked`; anything else lists all
    pub status: Option<String>,
}

/// GET /admin/ping
pub async fn ping() -> Json<Value> {
    Json(json!({ "ok": true, "scope": "admin" }))
}

/// GET /admin/djs?status=
pub async fn list_djs(
    State(state): State<AppState>,
    Query(query): Query<DjListQuery>,
) -> ApiResult<Json<Vec<DjProfileWithUser>>> {
    let status = query.status.as_deref().and_then(DjStatus::from_filter);
    Ok(Json(list_djs_with_user(&state.db, status).await?))
}

async fn moderate_dj(state: &AppState, raw_id: &str, status: DjStatus) -> ApiResult<Json<DjProfile>> {
    let id = parse_id(raw_id, "DJ not found")?;
    let profile = set_dj_status(&state.db, id, status).await?;
    info!(dj_id = %id, status = status.as_str(), "DJ status changed");
    Ok(Json(profile))
}

/// POST /admin/djs/:id/approve
pub async fn approve_dj(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DjProfile>> {
    moderate_dj(&state, &id, DjStatus::Approved).await
}

/// POST /admin/djs/:id/block
pub async fn block_dj(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DjProfile>> {
    moderate_dj(&state, &id, DjStatus::Blocked).await
}

/// POST /admin/djs/:id/reject (same as block)
pub async fn reject_dj(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DjProfile>> {
    moderate_dj(&state, &id, DjStatus::Blocked).await
}

/// GET /admin/mixes/pending
pub async fn list_pending_mixes(State(state): State<AppState>) -> ApiResult<Json<Vec<MixView>>> {
    let mixes = list_mixes_by_status(&state.db, MixStatus::Pending).await?;
    Ok(Json(mixes.into_iter().map(MixView::from).collect()))
}

async fn review_mix(state: &AppState, raw_id: &str, status: MixStatus) -> ApiResult<Json<MixView>> {
    let id = parse_id(raw_id, "Mix not found")?;
    let mix = set_mix_status(&state.db, id, status).await?;
    info!(mix_id = %id, status = status.as_str(), "Mix status changed");
    Ok(Json(MixView::from(mix)))
}

/// POST /admin/mixes/:id/approve
pub async fn approve_mix(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MixView>> {
    review_mix(&state, &id, MixStatus::Approved).await
}

/// POST /admin/mixes/:id/reject
pub async fn reject_mix(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MixView>> {
    review_mix(&state, &id, MixStatus::Rejected).await
}

/// POST /admin/mixes/:id/takedown
pub async fn takedown_mix(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MixView>> {
    review_mix(&state, &id, MixStatus::Rejected).await
}

/// Build admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/ping", get(ping))
        .route("/admin/djs", get(list_djs))
        .route("/admin/djs/:id/approve", post(approve_dj))
        .route("/admin/djs/:id/block", post(block_dj))
        .route("/admin/djs/:id/reject", post(reject_dj))
        .route("/admin/mixes/pending", get(list_pending_mixes))
        .route("/admin/mixes/:id/approve", post(approve_mix))
        .route("/admin/mixes/:id/reject", post(reject_mix))
        .route("/admin/mixes/:id/takedown", post(takedown_mix))
}
