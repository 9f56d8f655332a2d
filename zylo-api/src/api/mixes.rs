//! Mix upload and public listings

use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use futures::future::try_join;
use tracing::info;
use zylo_common::auth::Claims;
use zylo_common::db::djs::{create_dj_profile, find_dj_by_id, find_dj_by_user, NewDjProfile};
use zylo_common::db::mixes::{create_mix, list_mixes_by_status, list_mixes_for_dj, NewMix};
use zylo_common::models::{DjProfile, MixView};
use zylo_common::{DjStatus, MixStatus, Role};

use crate::api::dj::check_len;
use crate::api::upload::{audio_allowed, cover_allowed, MultipartForm};
use crate::api::{parse_id, MaybePrincipal, Principal};
use crate::media::ResourceType;
use crate::{ApiError, ApiResult, AppState};

/// Media host folder for mix audio and covers
pub const MIX_FOLDER: &str = "zylofm/mixes";

const MAX_TITLE: usize = 120;
const MAX_DESCRIPTION: usize = 1200;
const MAX_GENRE: usize = 80;

/// Profile that owns an upload by `claims`
///
/// DJs upload as themselves and must be approved. Admins (when allowed)
/// upload for an approved `dj_id`, or under their own "Admin Uploads" profile.
async fn resolve_upload_profile(
    state: &AppState,
    claims: &Claims,
    dj_id: Option<&str>,
) -> ApiResult<DjProfile> {
    match claims.role {
        Role::Dj => {
            let dj = find_dj_by_user(&state.db, claims.sub)
                .await?
                .ok_or_else(|| ApiError::Forbidden("DJ profile missing".to_string()))?;
            match dj.status {
                DjStatus::Approved => Ok(dj),
                DjStatus::Blocked => Err(ApiError::Forbidden("DJ is blocked".to_string())),
                DjStatus::Pending => Err(ApiError::Forbidden("DJ pending approval".to_string())),
            }
        }
        Role::Admin => {
            if !state.allow_admin_upload {
                return Err(ApiError::Forbidden(
                    "ADMIN upload disabled (set ALLOW_ADMIN_UPLOAD=true for local dev)".to_string(),
                ));
            }

            if let Some(raw) = dj_id {
                let invalid = || ApiError::BadRequest("Invalid djId".to_string());
                let id = uuid::Uuid::parse_str(raw).map_err(|_| invalid())?;
                let dj = find_dj_by_id(&state.db, id).await?.ok_or_else(invalid)?;
                if dj.status != DjStatus::Approved {
                    return Err(ApiError::BadRequest("djId must be APPROVED".to_string()));
                }
                return Ok(dj);
            }

            if let Some(existing) = find_dj_by_user(&state.db, claims.sub).await? {
                return Ok(existing);
            }
            let profile = create_dj_profile(
                &state.db,
                NewDjProfile {
                    user_id: claims.sub,
                    display_name: "Admin Uploads".to_string(),
                    bio: "Local admin uploads".to_string(),
                    location: Some("Local".to_string()),
                    genres: vec!["mixed".to_string()],
                    status: DjStatus::Approved,
                },
            )
            .await?;
            info!(dj_id = %profile.id, "Created Admin Uploads profile");
            Ok(profile)
        }
        Role::Listener => Err(ApiError::Forbidden("DJ only".to_string())),
    }
}

/// POST /mixes/upload (multipart)
///
/// Fields: `title`, `djId?`, `description?`, `genre?`, `isClean?`; files
/// `audio` and `cover`. The mix is created PENDING.
pub async fn upload_mix(
    State(state): State<AppState>,
    Principal(claims): Principal,
    multipart: Multipart,
) -> ApiResult<Json<MixView>> {
    let mut form = MultipartForm::read(multipart).await?;

    let title = form
        .text("title")
        .ok_or_else(|| ApiError::BadRequest("title required".to_string()))?
        .to_string();
    let audio = form
        .take_file("audio")
        .ok_or_else(|| ApiError::BadRequest("audio file required".to_string()))?;
    let cover = form
        .take_file("cover")
        .ok_or_else(|| ApiError::BadRequest("cover file required".to_string()))?;
    let description = form.text("description").unwrap_or_default().to_string();
    let genre = form.text("genre").unwrap_or_default().to_string();
    check_len("title", &title, MAX_TITLE)?;
    check_len("description", &description, MAX_DESCRIPTION)?;
    check_len("genre", &genre, MAX_GENRE)?;
    let is_clean = form.flag("isClean")?.unwrap_or(true);

    let dj = resolve_upload_profile(&state, &claims, form.text("djId")).await?;

    if !audio_allowed(&audio) {
        return Err(ApiError::BadRequest("audio must be mp3 or wav".to_string()));
    }
    if !cover_allowed(&cover) {
        return Err(ApiError::BadRequest("cover must be jpg, png, or webp".to_string()));
    }

    let (audio_up, cover_up) = try_join(
        state.media.upload(audio.into_media(MIX_FOLDER, ResourceType::Video)),
        state.media.upload(cover.into_media(MIX_FOLDER, ResourceType::Image)),
    )
    .await
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mix = create_mix(
        &state.db,
        NewMix {
            dj_id: dj.id,
            title,
            description,
            genre,
            audio_url: audio_up.secure_url,
            cover_url: cover_up.secure_url,
            is_clean,
        },
    )
    .await?;

    info!(mix_id = %mix.id, dj_id = %dj.id, "Mix uploaded (pending review)");
    Ok(Json(MixView::from(mix)))
}

/// GET /mixes
pub async fn list_public_mixes(State(state): State<AppState>) -> ApiResult<Json<Vec<MixView>>> {
    let mixes = list_mixes_by_status(&state.db, MixStatus::Approved).await?;
    Ok(Json(mixes.into_iter().map(MixView::from).collect()))
}

/// GET /djs/:id/mixes
///
/// The owning DJ and admins see every status; everyone else only APPROVED.
pub async fn list_dj_mixes(
    State(state): State<AppState>,
    MaybePrincipal(viewer): MaybePrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<MixView>>> {
    let id = parse_id(&id, "DJ not found")?;
    let dj = find_dj_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("DJ not found".to_string()))?;

    let can_see_all = match &viewer {
        Some(claims) if claims.role == Role::Admin => true,
        Some(claims) if claims.role == Role::Dj => claims.sub == dj.user_id,
        _ => false,
    };

    let mixes = list_mixes_for_dj(&state.db, dj.id, !can_see_all).await?;
    Ok(Json(mixes.into_iter().map(MixView::from).collect()))
}

/// Build mix routes
pub fn mix_routes() -> Router<AppState> {
    Router::new()
        .route("/mixes", get(list_public_mixes))
        .route("/mixes/upload", post(upload_mix))
        .route("/djs/:id/mixes", get(list_dj_mixes))
}
