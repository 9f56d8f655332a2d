//! Query → track matching
//!
//! A query is normalized into a lowercase phrase plus up to [`MAX_TOKENS`]
//! word tokens. The repository pre-filters active candidates (title contains
//! the phrase, or keywords intersect the tokens); each candidate is then
//! scored and the best one wins. Ties keep retrieval order, so the more
//! recently updated track wins.

use tracing::debug;

use crate::library::{LibraryFilter, LibraryRepository, RepositoryError};
use crate::models::LibraryItem;

/// Maximum tokens taken from a query
pub const MAX_TOKENS: usize = 8;
/// Minimum token length in characters
pub const MIN_TOKEN_CHARS: usize = 2;
/// Score awarded when the title contains the whole phrase
pub const TITLE_HIT_SCORE: u32 = 3;

/// Lowercased phrase and its word tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub q: String,
    pub tokens: Vec<String>,
}

/// Result of matching a query against the library
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched { item: LibraryItem, score: u32 },
    NoMatch,
}

/// Trim and lowercase `raw`, then split into tokens
///
/// Tokens shorter than two characters are dropped and at most
/// [`MAX_TOKENS`] are kept, in query order.
pub fn normalize_query(raw: &str) -> NormalizedQuery {
    let q = raw.trim().to_lowercase();
    let tokens = q
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .take(MAX_TOKENS)
        .map(str::to_string)
        .collect();

    NormalizedQuery { q, tokens }
}

/// Relevance of `item` for a normalized query
///
/// [`TITLE_HIT_SCORE`] if the lowercase title contains `q`, plus one per
/// token present in the item's keywords.
pub fn score(item: &LibraryItem, query: &NormalizedQuery) -> u32 {
    let title_hit = if item.title.to_lowercase().contains(&query.q) {
        TITLE_HIT_SCORE
    } else {
        0
    };
    let keyword_hits = query
        .tokens
        .iter()
        .filter(|t| item.keywords.contains(t))
        .count() as u32;

    title_hit + keyword_hits
}

/// Highest-scoring candidate with its score; the earliest wins among equals
pub fn select_best(candidates: Vec<LibraryItem>, query: &NormalizedQuery) -> Option<(LibraryItem, u32)> {
    let mut best: Option<(LibraryItem, u32)> = None;
    for item in candidates {
        let s = score(&item, query);
        match &best {
            Some((_, top)) if *top >= s => {}
            _ => best = Some((item, s)),
        }
    }
    best
}

/// Match a raw query against the active library
///
/// An empty query is `NoMatch` without touching the repository.
pub async fn match_query<R>(repo: &R, raw: &str) -> Result<MatchOutcome, RepositoryError>
where
    R: LibraryRepository + ?Sized,
{
    let query = normalize_query(raw);
    if query.q.is_empty() {
        return Ok(MatchOutcome::NoMatch);
    }

    let candidates = repo
        .find_many(&LibraryFilter::candidates(&query.q, &query.tokens))
        .await?;
    debug!(q = %query.q, tokens = ?query.tokens, candidates = candidates.len(), "Assistant candidates");

    Ok(match select_best(candidates, &query) {
        Some((item, score)) => MatchOutcome::Matched { item, score },
        None => MatchOutcome::NoMatch,
    })
}
