//! DJ onboarding and public profiles

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use zylo_common::db::djs::{
    create_dj_profile, find_dj_by_id, find_dj_by_user, list_approved_djs, update_dj_profile,
    DjProfilePatch, NewDjProfile,
};
use zylo_common::db::users::{find_user_by_id, set_user_role};
use zylo_common::models::DjProfile;
use zylo_common::{DjStatus, Role};

use crate::api::{parse_id, Principal};
use crate::{ApiError, ApiResult, AppState};

const MAX_DISPLAY_NAME: usize = 60;
const MAX_BIO: usize = 600;
const MAX_LOCATION: usize = 80;
const MAX_GENRES: usize = 12;
const MAX_GENRE_LEN: usize = 32;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDjProfileRequest {
    pub display_name: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub genres: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDjProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub genres: Option<Vec<String>>,
}

pub(crate) fn check_len(field: &str, value: &str, max: usize) -> ApiResult<()> {
    if value.chars().count() > max {
        return Err(ApiError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Trim genres, drop blanks, enforce limits
fn clean_genres(raw: Vec<String>) -> ApiResult<Vec<String>> {
    if raw.len() > MAX_GENRES {
        return Err(ApiError::BadRequest(format!(
            "genres must contain at most {} items",
            MAX_GENRES
        )));
    }
    let genres: Vec<String> = raw
        .iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect();
    for genre in &genres {
        check_len("each genre", genre, MAX_GENRE_LEN)?;
    }
    Ok(genres)
}

/// POST /dj/me
///
/// The caller's role becomes DJ; a new token is needed to use DJ routes.
pub async fn create_my_profile(
    State(state): State<AppState>,
    Principal(claims): Principal,
    Json(payload): Json<CreateDjProfileRequest>,
) -> ApiResult<Json<DjProfile>> {
    let display_name = payload.display_name.trim().to_string();
    if display_name.is_empty() {
        return Err(ApiError::BadRequest("displayName required".to_string()));
    }
    check_len("displayName", &display_name, MAX_DISPLAY_NAME)?;
    let bio = payload.bio.as_deref().map(str::trim).unwrap_or_default().to_string();
    check_len("bio", &bio, MAX_BIO)?;
    let location = payload
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string);
    if let Some(loc) = &location {
        check_len("location", loc, MAX_LOCATION)?;
    }
    let genres = clean_genres(payload.genres.unwrap_or_default())?;

    if find_dj_by_user(&state.db, claims.sub).await?.is_some() {
        return Err(ApiError::Conflict("DJ profile already exists".to_string()));
    }
    let user = find_user_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    if user.role == Role::Admin {
        return Err(ApiError::Forbidden("Admin cannot become DJ".to_string()));
    }

    let profile = create_dj_profile(
        &state.db,
        NewDjProfile {
            user_id: user.id,
            display_name,
            bio,
            location,
            genres,
            status: DjStatus::Pending,
        },
    )
    .await?;
    set_user_role(&state.db, user.id, Role::Dj).await?;

    info!(user_id = %user.id, dj_id = %profile.id, "DJ profile created (pending approval)");
    Ok(Json(profile))
}

/// GET /dj/me
pub async fn get_my_profile(
    State(state): State<AppState>,
    Principal(claims): Principal,
) -> ApiResult<Json<DjProfile>> {
    find_dj_by_user(&state.db, claims.sub)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("DJ profile not found".to_string()))
}

/// PATCH /dj/me
///
/// Only supplied fields change. A blank location clears it.
pub async fn update_my_profile(
    State(state): State<AppState>,
    Principal(claims): Principal,
    Json(payload): Json<UpdateDjProfileRequest>,
) -> ApiResult<Json<DjProfile>> {
    let profile = find_dj_by_user(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("DJ profile not found".to_string()))?;

    let mut patch = DjProfilePatch::default();
    if let Some(name) = payload.display_name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::BadRequest("displayName cannot be blank".to_string()));
        }
        check_len("displayName", &name, MAX_DISPLAY_NAME)?;
        patch.display_name = Some(name);
    }
    if let Some(bio) = payload.bio {
        let bio = bio.trim().to_string();
        check_len("bio", &bio, MAX_BIO)?;
        patch.bio = Some(bio);
    }
    if let Some(location) = payload.location {
        let location = location.trim().to_string();
        check_len("location", &location, MAX_LOCATION)?;
        patch.location = Some((!location.is_empty()).then_some(location));
    }
    if let Some(genres) = payload.genres {
        patch.genres = Some(clean_genres(genres)?);
    }

    let updated = update_dj_profile(&state.db, profile.id, patch).await?;
    Ok(Json(updated))
}

/// GET /dj/:id
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DjProfile>> {
    let id = parse_id(&id, "DJ not found")?;
    find_dj_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("DJ not found".to_string()))
}

/// GET /djs
pub async fn list_public_profiles(State(state): State<AppState>) -> ApiResult<Json<Vec<DjProfile>>> {
    Ok(Json(list_approved_djs(&state.db).await?))
}

/// Build DJ profile routes
pub fn dj_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/dj/me",
            get(get_my_profile)
                .post(create_my_profile)
                .patch(update_my_profile),
        )
        .route("/dj/:id", get(get_public_profile))
        .route("/djs", get(list_public_profiles))
}
