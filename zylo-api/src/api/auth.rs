//! Account registration, login and token introspection

use axum::{extract::State, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use zylo_common::auth::{hash_password, verify_password, Claims};
use zylo_common::db::djs::{create_dj_profile, NewDjProfile};
use zylo_common::db::users::{create_user, find_user_by_email};
use zylo_common::models::UserSummary;
use zylo_common::{DjStatus, Role};

use crate::api::Principal;
use crate::{ApiError, ApiResult, AppState};

/// Minimum password length for self-registration
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// A non-blank name registers the account as a DJ with a pending profile
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Claims,
}

/// Trimmed, lowercased email
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Basic shape check: `local@domain.tld`, no spaces
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("email must be a valid email address".to_string()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if find_user_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let display_name = payload
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let role = if display_name.is_some() { Role::Dj } else { Role::Listener };

    let password_hash = hash_password(&payload.password)?;
    let user = create_user(&state.db, &email, &password_hash, role).await?;

    if let Some(name) = display_name {
        create_dj_profile(
            &state.db,
            NewDjProfile {
                user_id: user.id,
                display_name: name.to_string(),
                bio: String::new(),
                location: None,
                genres: Vec::new(),
                status: DjStatus::Pending,
            },
        )
        .await?;
    }

    info!(user_id = %user.id, role = %user.role, "Registered user");

    let summary = UserSummary::from(&user);
    Ok(Json(TokenResponse {
        access_token: state.tokens.issue(&summary)?,
        user: summary,
    }))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let email = normalize_email(&payload.email);
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = find_user_by_email(&state.db, &email).await?.ok_or_else(invalid)?;
    verify_password(&payload.password, &user.password_hash).map_err(|e| match e {
        zylo_common::Error::Unauthorized(_) => invalid(),
        other => ApiError::from(other),
    })?;

    let summary = UserSummary::from(&user);
    Ok(Json(TokenResponse {
        access_token: state.tokens.issue(&summary)?,
        user: summary,
    }))
}

/// GET /auth/me
pub async fn me(Principal(claims): Principal) -> Json<MeResponse> {
    Json(MeResponse { user: claims })
}

/// Build auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("dj@zylo.fm"));
        assert!(is_valid_email("first.last@mail.example.com"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@zylo.fm"));
        assert!(!is_valid_email("dj@localhost"));
        assert!(!is_valid_email("dj@@zylo.fm"));
        assert!(!is_valid_email("d j@zylo.fm"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  DJ@Zylo.FM "), "dj@zylo.fm");
    }
}
