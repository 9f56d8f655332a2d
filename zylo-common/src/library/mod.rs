//! Assistant library persistence interface
//!
//! The library is reached only through [`LibraryRepository`] so the matcher
//! and the HTTP handlers run unchanged against SQLite
//! ([`crate::db::library::SqliteLibrary`]) or the in-memory
//! [`InMemoryLibrary`].

mod memory;

pub use memory::InMemoryLibrary;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::LibraryItem;

/// Maximum candidates returned to the matcher
pub const CANDIDATE_LIMIT: usize = 25;
/// Maximum items in the public client listing
pub const PUBLIC_LIST_LIMIT: usize = 200;
/// Maximum keywords kept on an item
pub const MAX_KEYWORDS: usize = 40;
/// Maximum keywords parsed from an upload form field
pub const MAX_UPLOAD_KEYWORDS: usize = 20;
/// Maximum length of a single keyword
pub const MAX_KEYWORD_LEN: usize = 40;
/// Maximum title length
pub const MAX_TITLE_LEN: usize = 120;

/// Repository failure
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Library item not found: {0}")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Storage(err.to_string())
    }
}

impl From<RepositoryError> for crate::Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => crate::Error::NotFound("Library item not found".to_string()),
            RepositoryError::Storage(msg) => crate::Error::Internal(msg),
        }
    }
}

/// Coarse text pre-filter: title contains `q` OR keywords intersect `tokens`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearch {
    /// Normalized (trimmed, lowercase) query
    pub q: String,
    pub tokens: Vec<String>,
}

/// Selection passed to [`LibraryRepository::find_many`]
///
/// Results are always ordered most-recently-updated first.
#[derive(Debug, Clone, Default)]
pub struct LibraryFilter {
    pub active_only: bool,
    pub search: Option<TextSearch>,
    pub limit: Option<usize>,
}

impl LibraryFilter {
    /// Every item, newest first
    pub fn all() -> Self {
        Self::default()
    }

    /// Active items only, capped at `limit`
    pub fn active(limit: usize) -> Self {
        Self {
            active_only: true,
            search: None,
            limit: Some(limit),
        }
    }

    /// Active candidates for a normalized query
    pub fn candidates(q: &str, tokens: &[String]) -> Self {
        Self {
            active_only: true,
            search: Some(TextSearch {
                q: q.to_string(),
                tokens: tokens.to_vec(),
            }),
            limit: Some(CANDIDATE_LIMIT),
        }
    }

    /// Whether `item` passes this filter (ordering and limit aside)
    pub fn matches(&self, item: &LibraryItem) -> bool {
        if self.active_only && !item.is_active {
            return false;
        }
        match &self.search {
            None => true,
            Some(search) => {
                item.title.to_lowercase().contains(&search.q)
                    || search.tokens.iter().any(|t| item.keywords.contains(t))
            }
        }
    }
}

/// Fields for a new library item
#[derive(Debug, Clone)]
pub struct NewLibraryItem {
    pub title: String,
    pub audio_url: String,
    pub keywords: Vec<String>,
    pub is_active: bool,
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct LibraryPatch {
    pub title: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl LibraryPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.keywords.is_none() && self.is_active.is_none()
    }
}

/// Plain CRUD interface over the assistant library
#[async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Items passing `filter`, most-recently-updated first
    async fn find_many(&self, filter: &LibraryFilter) -> Result<Vec<LibraryItem>, RepositoryError>;

    async fn find_unique(&self, id: Uuid) -> Result<Option<LibraryItem>, RepositoryError>;

    async fn create(&self, item: NewLibraryItem) -> Result<LibraryItem, RepositoryError>;

    /// Apply `patch` and bump `updated_at`
    ///
    /// Returns `Err(RepositoryError::NotFound)` if the item doesn't exist.
    async fn update(&self, id: Uuid, patch: LibraryPatch) -> Result<LibraryItem, RepositoryError>;

    /// Returns `Err(RepositoryError::NotFound)` if the item doesn't exist.
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// Normalize keyword tags: trim, lowercase, drop blanks and duplicates, cap
pub fn normalize_keywords<I, S>(raw: I, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for keyword in raw {
        let k = keyword.as_ref().trim().to_lowercase();
        if k.is_empty() || out.contains(&k) {
            continue;
        }
        out.push(k);
        if out.len() == cap {
            break;
        }
    }
    out
}

/// Split a comma/space separated keyword field into raw pieces
pub fn split_keyword_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
}

/// Parse a comma/space separated keyword field (`"afro, intro chill"`)
pub fn parse_keyword_list(raw: &str, cap: usize) -> Vec<String> {
    normalize_keywords(split_keyword_list(raw), cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(title: &str, keywords: &[&str], active: bool) -> LibraryItem {
        let now = Utc::now();
        LibraryItem {
            id: Uuid::new_v4(),
            title: title.to_string(),
            audio_url: "https://cdn.test/a.mp3".to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            is_active: active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_normalize_keywords() {
        let out = normalize_keywords(["  Salsa", "salsa", "", "BACHATA ", "amor"], 40);
        assert_eq!(out, vec!["salsa", "bachata", "amor"]);
    }

    #[test]
    fn test_normalize_keywords_caps() {
        let raw: Vec<String> = (0..50).map(|i| format!("k{i}")).collect();
        assert_eq!(normalize_keywords(&raw, MAX_KEYWORDS).len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_parse_keyword_list() {
        assert_eq!(
            parse_keyword_list("afro, Intro  chill,,afro", MAX_UPLOAD_KEYWORDS),
            vec!["afro", "intro", "chill"]
        );
        assert!(parse_keyword_list("   ", MAX_UPLOAD_KEYWORDS).is_empty());
    }

    #[test]
    fn test_filter_matches_title_or_keywords() {
        let filter = LibraryFilter::candidates("amor", &["amor".to_string()]);

        assert!(filter.matches(&item("Amor Eterno", &[], true)));
        assert!(filter.matches(&item("Otra", &["amor"], true)));
        assert!(!filter.matches(&item("Salsa Dura", &["salsa"], true)));
        assert!(!filter.matches(&item("Amor Eterno", &["amor"], false)));
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(LibraryPatch::default().is_empty());
        assert!(!LibraryPatch {
            is_active: Some(false),
            ..Default::default()
        }
        .is_empty());
    }
}
