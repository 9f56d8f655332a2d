//! Voice assistant: query playback and library management

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;
use zylo_common::assistant::{match_query, MatchOutcome, LIBRARY_FOLDER};
use zylo_common::config::parse_flag;
use zylo_common::library::{
    normalize_keywords, parse_keyword_list, split_keyword_list, LibraryFilter, LibraryPatch, NewLibraryItem,
    MAX_KEYWORDS, MAX_KEYWORD_LEN, MAX_TITLE_LEN, MAX_UPLOAD_KEYWORDS, PUBLIC_LIST_LIMIT,
};
use zylo_common::models::{LibraryItem, PublicLibraryItem};

use crate::api::parse_id;
use crate::api::upload::{audio_allowed, MultipartForm};
use crate::media::ResourceType;
use crate::{ApiError, ApiResult, AppState};

/// Longest accepted spoken query
pub const MAX_QUERY_LEN: usize = 200;

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct MatchedTrack {
    pub id: Uuid,
    pub title: String,
    pub keywords: Vec<String>,
}

/// Outcome of POST /assistant/play
#[derive(Debug)]
pub enum PlayResponse {
    Ok {
        query: String,
        audio_url: String,
        track: MatchedTrack,
    },
    NoMatch,
}

impl IntoResponse for PlayResponse {
    fn into_response(self) -> Response {
        match self {
            PlayResponse::Ok {
                query,
                audio_url,
                track,
            } => (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "query": query,
                    "audioUrl": audio_url,
                    "match": track,
                })),
            )
                .into_response(),
            PlayResponse::NoMatch => {
                (StatusCode::NOT_FOUND, Json(json!({ "status": "no_match" }))).into_response()
            }
        }
    }
}

/// POST /assistant/play
pub async fn play(
    State(state): State<AppState>,
    Json(payload): Json<PlayRequest>,
) -> ApiResult<PlayResponse> {
    if payload.query.chars().count() > MAX_QUERY_LEN {
        return Err(ApiError::BadRequest(format!(
            "query must be at most {} characters",
            MAX_QUERY_LEN
        )));
    }

    match match_query(state.library.as_ref(), &payload.query).await? {
        MatchOutcome::Matched { item, score } => {
            debug!(item_id = %item.id, score, "Assistant match");
            Ok(PlayResponse::Ok {
                query: payload.query,
                audio_url: item.audio_url,
                track: MatchedTrack {
                    id: item.id,
                    title: item.title,
                    keywords: item.keywords,
                },
            })
        }
        MatchOutcome::NoMatch => Ok(PlayResponse::NoMatch),
    }
}

/// GET /assistant/library/public
pub async fn list_public_items(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PublicLibraryItem>>> {
    let items = state
        .library
        .find_many(&LibraryFilter::active(PUBLIC_LIST_LIMIT))
        .await?;
    Ok(Json(items.into_iter().map(PublicLibraryItem::from).collect()))
}

/// GET /assistant/library
pub async fn list_items(State(state): State<AppState>) -> ApiResult<Json<Vec<LibraryItem>>> {
    Ok(Json(state.library.find_many(&LibraryFilter::all()).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub title: String,
    pub audio_url: String,
    pub keywords: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Keyword list given either as an array or as `"a, b c"` text
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum KeywordsInput {
    List(Vec<String>),
    Text(String),
}

/// Boolean given as JSON bool or a flag string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FlagInput {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub keywords: Option<KeywordsInput>,
    pub is_active: Option<FlagInput>,
}

fn clean_title(raw: &str) -> ApiResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::BadRequest(format!(
            "title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

fn check_keyword_lengths<'a>(raw: impl IntoIterator<Item = &'a str>) -> ApiResult<()> {
    if raw.into_iter().any(|k| k.trim().chars().count() > MAX_KEYWORD_LEN) {
        return Err(ApiError::BadRequest(format!(
            "each keyword must be at most {} characters",
            MAX_KEYWORD_LEN
        )));
    }
    Ok(())
}

fn clean_keywords(raw: &[String]) -> ApiResult<Vec<String>> {
    check_keyword_lengths(raw.iter().map(String::as_str))?;
    Ok(normalize_keywords(raw, MAX_KEYWORDS))
}

/// Keywords given as `"a, b c"` text
fn clean_keyword_text(raw: &str, cap: usize) -> ApiResult<Vec<String>> {
    check_keyword_lengths(split_keyword_list(raw))?;
    Ok(parse_keyword_list(raw, cap))
}

/// Absolute http(s) URL with a host
fn is_http_url(raw: &str) -> bool {
    let rest = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !raw.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// POST /assistant/library
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> ApiResult<Json<LibraryItem>> {
    let title = clean_title(&payload.title)?;
    let audio_url = payload.audio_url.trim().to_string();
    if !is_http_url(&audio_url) {
        return Err(ApiError::BadRequest("audioUrl must be a URL".to_string()));
    }
    let keywords = clean_keywords(&payload.keywords.unwrap_or_default())?;

    let item = state
        .library
        .create(NewLibraryItem {
            title,
            audio_url,
            keywords,
            is_active: payload.is_active.unwrap_or(true),
        })
        .await?;

    info!(item_id = %item.id, title = %item.title, "Assistant library item created");
    Ok(Json(item))
}

/// PATCH /assistant/library/:id
///
/// An empty patch returns the item unchanged.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateItemRequest>,
) -> ApiResult<Json<LibraryItem>> {
    let id = parse_id(&id, "Library item not found")?;
    let existing = state
        .library
        .find_unique(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Library item not found".to_string()))?;

    let mut patch = LibraryPatch::default();
    if let Some(title) = payload.title {
        patch.title = Some(clean_title(&title)?);
    }
    if let Some(keywords) = payload.keywords {
        patch.keywords = Some(match keywords {
            KeywordsInput::List(list) => clean_keywords(&list)?,
            KeywordsInput::Text(text) => clean_keyword_text(&text, MAX_KEYWORDS)?,
        });
    }
    if let Some(flag) = payload.is_active {
        patch.is_active = Some(match flag {
            FlagInput::Bool(b) => b,
            FlagInput::Text(text) => parse_flag(&text)
                .ok_or_else(|| ApiError::BadRequest("isActive must be a boolean".to_string()))?,
        });
    }

    if patch.is_empty() {
        return Ok(Json(existing));
    }

    let item = state.library.update(id, patch).await?;
    info!(item_id = %item.id, "Assistant library item updated");
    Ok(Json(item))
}

/// DELETE /assistant/library/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "Library item not found")?;
    state.library.delete(id).await?;
    info!(item_id = %id, "Assistant library item deleted");
    Ok(Json(json!({ "ok": true })))
}

/// POST /assistant/library/upload (multipart)
///
/// Fields: `title`, `keywords?` (comma/space separated), `isActive?`; file
/// `audio`.
pub async fn upload_item(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<LibraryItem>> {
    let mut form = MultipartForm::read(multipart).await?;

    let title = clean_title(form.text("title").unwrap_or_default())?;
    let audio = form
        .take_file("audio")
        .ok_or_else(|| ApiError::BadRequest("audio file required".to_string()))?;
    if !audio_allowed(&audio) {
        return Err(ApiError::BadRequest("audio must be mp3 or wav".to_string()));
    }
    let keywords = clean_keyword_text(form.text("keywords").unwrap_or_default(), MAX_UPLOAD_KEYWORDS)?;
    let is_active = form.flag("isActive")?.unwrap_or(true);

    let uploaded = state
        .media
        .upload(audio.into_media(LIBRARY_FOLDER, ResourceType::Video))
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let item = state
        .library
        .create(NewLibraryItem {
            title,
            audio_url: uploaded.secure_url,
            keywords,
            is_active,
        })
        .await?;

    info!(item_id = %item.id, public_id = %uploaded.public_id, "Assistant track uploaded");
    Ok(Json(item))
}

/// Build assistant routes
pub fn assistant_routes() -> Router<AppState> {
    Router::new()
        .route("/assistant/play", post(play))
        .route("/assistant/library/public", get(list_public_items))
        .route("/assistant/library", get(list_items).post(create_item))
        .route("/assistant/library/upload", post(upload_item))
        .route("/assistant/library/:id", patch(update_item).delete(delete_item))
}
