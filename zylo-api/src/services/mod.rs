//! Startup services

pub mod bootstrap;

pub use bootstrap::{seed_admin, SeedOutcome, MIN_ADMIN_PASSWORD_LEN};
