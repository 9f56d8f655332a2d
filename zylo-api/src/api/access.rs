//! Route access policy
//!
//! Each (method, route template) pair has a static [`Access`] requirement.
//! [`access_middleware`] runs as a route layer, decodes the bearer token when
//! the route needs one, and stores the caller as a [`Principal`] in the
//! request extensions for handlers to extract.

use axum::{
    async_trait,
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use zylo_common::auth::Claims;
use zylo_common::Role;

use crate::{ApiError, AppState};

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const DJ_ONLY: &[Role] = &[Role::Dj];
const DJ_OR_ADMIN: &[Role] = &[Role::Dj, Role::Admin];

/// What a caller needs to reach a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No token is read
    Public,
    /// A valid token is used if present; missing or invalid means anonymous
    Optional,
    /// Any valid token
    Authenticated,
    /// A valid token carrying one of these roles
    Roles(&'static [Role]),
}

/// Requirement per (method, route template)
const POLICY: &[(&str, &str, Access)] = &[
    ("GET", "/health", Access::Public),
    // Auth
    ("POST", "/auth/register", Access::Public),
    ("POST", "/auth/login", Access::Public),
    ("GET", "/auth/me", Access::Authenticated),
    // DJ profiles
    ("POST", "/dj/me", Access::Authenticated),
    ("GET", "/dj/me", Access::Roles(DJ_ONLY)),
    ("PATCH", "/dj/me", Access::Roles(DJ_ONLY)),
    ("GET", "/dj/:id", Access::Public),
    ("GET", "/djs", Access::Public),
    ("GET", "/djs/:id/mixes", Access::Optional),
    // Mixes
    ("GET", "/mixes", Access::Public),
    ("POST", "/mixes/upload", Access::Roles(DJ_OR_ADMIN)),
    // Admin
    ("GET", "/admin/ping", Access::Roles(ADMIN_ONLY)),
    ("GET", "/admin/djs", Access::Roles(ADMIN_ONLY)),
    ("POST", "/admin/djs/:id/approve", Access::Roles(ADMIN_ONLY)),
    ("POST", "/admin/djs/:id/block", Access::Roles(ADMIN_ONLY)),
    ("POST", "/admin/djs/:id/reject", Access::Roles(ADMIN_ONLY)),
    ("GET", "/admin/mixes/pending", Access::Roles(ADMIN_ONLY)),
    ("POST", "/admin/mixes/:id/approve", Access::Roles(ADMIN_ONLY)),
    ("POST", "/admin/mixes/:id/reject", Access::Roles(ADMIN_ONLY)),
    ("POST", "/admin/mixes/:id/takedown", Access::Roles(ADMIN_ONLY)),
    // Assistant
    ("POST", "/assistant/play", Access::Public),
    ("GET", "/assistant/library/public", Access::Public),
    ("GET", "/assistant/library", Access::Roles(ADMIN_ONLY)),
    ("POST", "/assistant/library", Access::Roles(ADMIN_ONLY)),
    ("POST", "/assistant/library/upload", Access::Roles(ADMIN_ONLY)),
    ("PATCH", "/assistant/library/:id", Access::Roles(ADMIN_ONLY)),
    ("DELETE", "/assistant/library/:id", Access::Roles(ADMIN_ONLY)),
];

/// Requirement for a route, `None` if the route has no policy entry
pub fn required_access(method: &str, route: &str) -> Option<Access> {
    POLICY
        .iter()
        .find(|(m, r, _)| *m == method && *r == route)
        .map(|(_, _, access)| *access)
}

/// Every route template with a policy entry
pub fn policy_routes() -> impl Iterator<Item = (&'static str, &'static str)> {
    POLICY.iter().map(|(m, r, _)| (*m, *r))
}

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct Principal(pub Claims);

/// Caller on an [`Access::Optional`] route
#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Option<Claims>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybePrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybePrincipal(
            parts.extensions.get::<Principal>().map(|p| p.0.clone()),
        ))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Method used for the policy lookup; axum serves HEAD from GET handlers
fn policy_method(method: &Method) -> &str {
    if *method == Method::HEAD {
        "GET"
    } else {
        method.as_str()
    }
}

/// Enforce [`POLICY`] for the matched route
///
/// Routes missing from the table are treated as admin-only.
pub async fn access_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let method = policy_method(request.method()).to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let access = match required_access(&method, &route) {
        Some(access) => access,
        None => {
            warn!("No access policy for {} {}, requiring ADMIN", method, route);
            Access::Roles(ADMIN_ONLY)
        }
    };

    if access == Access::Public {
        return Ok(next.run(request).await);
    }

    let claims = bearer_token(request.headers()).map(|token| state.tokens.verify(token));

    let principal = match (access, claims) {
        (Access::Optional, Some(Ok(claims))) => Some(claims),
        (Access::Optional, _) => None,
        (_, None) => {
            debug!("{} {} rejected: missing bearer token", method, route);
            return Err(ApiError::Unauthorized("Missing bearer token".to_string()));
        }
        (_, Some(Err(e))) => {
            debug!("{} {} rejected: {}", method, route, e);
            return Err(ApiError::Unauthorized("Invalid or expired token".to_string()));
        }
        (Access::Roles(roles), Some(Ok(claims))) => {
            if !roles.contains(&claims.role) {
                debug!(
                    "{} {} rejected: role {} not in {:?}",
                    method, route, claims.role, roles
                );
                return Err(ApiError::Forbidden("Forbidden".to_string()));
            }
            Some(claims)
        }
        (_, Some(Ok(claims))) => Some(claims),
    };

    if let Some(claims) = principal {
        request.extensions_mut().insert(Principal(claims));
    }
    Ok(next.run(request).await)
}
