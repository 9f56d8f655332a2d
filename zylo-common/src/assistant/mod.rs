//! Assistant voice-query matching

pub mod matcher;

pub use matcher::{match_query, normalize_query, score, select_best, MatchOutcome, NormalizedQuery};

/// Media host folder for assistant library uploads
pub const LIBRARY_FOLDER: &str = "zylofm/assistant_library";
