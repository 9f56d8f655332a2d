//! Domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Account role carried in access tokens and checked by the access policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Dj,
    Listener,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Dj => "DJ",
            Role::Listener => "LISTENER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "DJ" => Ok(Role::Dj),
            "LISTENER" => Ok(Role::Listener),
            other => Err(Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// DJ profile moderation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DjStatus {
    Pending,
    Approved,
    Blocked,
}

impl DjStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DjStatus::Pending => "PENDING",
            DjStatus::Approved => "APPROVED",
            DjStatus::Blocked => "BLOCKED",
        }
    }

    /// Parse the loose, lowercase filter values used by the admin dashboard
    ///
    /// Returns `None` for anything unrecognised, which callers treat as "all".
    pub fn from_filter(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Some(DjStatus::Pending),
            "approved" => Some(DjStatus::Approved),
            "blocked" => Some(DjStatus::Blocked),
            _ => None,
        }
    }
}

impl FromStr for DjStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(DjStatus::Pending),
            "APPROVED" => Ok(DjStatus::Approved),
            "BLOCKED" => Ok(DjStatus::Blocked),
            other => Err(Error::InvalidInput(format!("Unknown DJ status: {}", other))),
        }
    }
}

/// Mix review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MixStatus {
    Pending,
    Approved,
    Rejected,
}

impl MixStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MixStatus::Pending => "PENDING",
            MixStatus::Approved => "APPROVED",
            MixStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for MixStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(MixStatus::Pending),
            "APPROVED" => Ok(MixStatus::Approved),
            "REJECTED" => Ok(MixStatus::Rejected),
            other => Err(Error::InvalidInput(format!("Unknown mix status: {}", other))),
        }
    }
}

/// Registered account
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Public-facing subset of a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// DJ profile attached to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DjProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub bio: String,
    pub location: Option<String>,
    pub genres: Vec<String>,
    pub status: DjStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DJ profile joined with its owning user (admin listing)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DjProfileWithUser {
    #[serde(flatten)]
    pub profile: DjProfile,
    pub user: UserSummary,
}

/// Uploaded DJ mix
#[derive(Debug, Clone)]
pub struct Mix {
    pub id: Uuid,
    pub dj_id: Uuid,
    pub dj_name: Option<String>,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub audio_url: String,
    pub cover_url: String,
    pub status: MixStatus,
    pub is_clean: bool,
    pub created_at: DateTime<Utc>,
}

/// API representation of a mix (status rendered lowercase)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixView {
    pub id: Uuid,
    pub dj_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dj_name: Option<String>,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub audio_url: String,
    pub cover_url: String,
    pub status: String,
    pub is_clean: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Mix> for MixView {
    fn from(mix: Mix) -> Self {
        Self {
            id: mix.id,
            dj_id: mix.dj_id,
            dj_name: mix.dj_name,
            title: mix.title,
            description: mix.description,
            genre: mix.genre,
            audio_url: mix.audio_url,
            cover_url: mix.cover_url,
            status: mix.status.as_str().to_lowercase(),
            is_clean: mix.is_clean,
            created_at: mix.created_at,
        }
    }
}

/// Assistant library track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub id: Uuid,
    pub title: String,
    pub audio_url: String,
    /// Always lowercase
    pub keywords: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Library item as exposed to the public client app (no activation flag)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicLibraryItem {
    pub id: Uuid,
    pub title: String,
    pub audio_url: String,
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LibraryItem> for PublicLibraryItem {
    fn from(item: LibraryItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            audio_url: item.audio_url,
            keywords: item.keywords,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}
