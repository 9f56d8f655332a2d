//! # ZyloFM Common Library
//!
//! Shared code for the ZyloFM backend including:
//! - Domain models (users, DJ profiles, mixes, assistant library)
//! - Configuration loading
//! - Password hashing and access tokens
//! - Database initialization and queries
//! - The assistant library repository and query matcher

pub mod assistant;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{DjStatus, MixStatus, Role};
