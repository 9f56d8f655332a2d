//! Admin account bootstrap

use sqlx::SqlitePool;
use tracing::{debug, info};
use zylo_common::auth::hash_password;
use zylo_common::config::AdminSeedConfig;
use zylo_common::db::users::upsert_admin;
use zylo_common::{Error, Result};

use crate::api::auth::{is_valid_email, normalize_email};

/// Seeded admin passwords are held to a longer minimum than self-registration
pub const MIN_ADMIN_PASSWORD_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Seeding disabled or credentials missing
    Skipped,
    /// ADMIN account created or reset for this email
    Seeded(String),
}

/// Upsert the configured ADMIN account
///
/// An existing account with the same email gets its password replaced and is
/// promoted to ADMIN.
pub async fn seed_admin(pool: &SqlitePool, config: &AdminSeedConfig) -> Result<SeedOutcome> {
    if !config.enabled {
        debug!("Admin auto-seed disabled");
        return Ok(SeedOutcome::Skipped);
    }

    let email = config.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = config.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        debug!("Admin auto-seed enabled but credentials not set, skipping");
        return Ok(SeedOutcome::Skipped);
    }

    if !is_valid_email(&email) {
        return Err(Error::Config(format!("ADMIN_EMAIL is not a valid email: {}", email)));
    }
    if password.chars().count() < MIN_ADMIN_PASSWORD_LEN {
        return Err(Error::Config(format!(
            "ADMIN_PASSWORD must be at least {} characters",
            MIN_ADMIN_PASSWORD_LEN
        )));
    }

    let hash = hash_password(password)?;
    let user = upsert_admin(pool, &email, &hash).await?;
    info!(user_id = %user.id, "Seeded admin account {}", user.email);

    Ok(SeedOutcome::Seeded(user.email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zylo_common::auth::verify_password;
    use zylo_common::db::init_memory_database;
    use zylo_common::db::users::find_user_by_email;
    use zylo_common::Role;

    fn seed(enabled: bool, email: Option<&str>, password: Option<&str>) -> AdminSeedConfig {
        AdminSeedConfig {
            enabled,
            email: email.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_disabled_or_incomplete_skips() {
        let pool = init_memory_database().await.unwrap();

        for config in [
            seed(false, Some("root@zylo.fm"), Some("long-enough-pass")),
            seed(true, None, Some("long-enough-pass")),
            seed(true, Some("root@zylo.fm"), None),
            seed(true, Some("  "), Some("long-enough-pass")),
        ] {
            assert_eq!(seed_admin(&pool, &config).await.unwrap(), SeedOutcome::Skipped);
        }
        assert!(find_user_by_email(&pool, "root@zylo.fm").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_short_password_is_error() {
        let pool = init_memory_database().await.unwrap();
        let result = seed_admin(&pool, &seed(true, Some("root@zylo.fm"), Some("short"))).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_seed_creates_then_resets_admin() {
        let pool = init_memory_database().await.unwrap();

        let outcome = seed_admin(&pool, &seed(true, Some(" Root@Zylo.FM "), Some("first-password")))
            .await
            .unwrap();
        assert_eq!(outcome, SeedOutcome::Seeded("root@zylo.fm".to_string()));

        seed_admin(&pool, &seed(true, Some("root@zylo.fm"), Some("second-password")))
            .await
            .unwrap();

        let user = find_user_by_email(&pool, "root@zylo.fm").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(verify_password("second-password", &user.password_hash).is_ok());
        assert!(verify_password("first-password", &user.password_hash).is_err());
    }
}
