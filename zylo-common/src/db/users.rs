//! User account queries

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{decode_ts, decode_uuid, encode_ts};
use crate::models::{Role, User};
use crate::{time, Error, Result};

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let id: String = row.get("id");
    let role: String = row.get("role");
    let created_at: String = row.get("created_at");

    Ok(User {
        id: decode_uuid(&id)?,
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: role.parse()?,
        created_at: decode_ts(&created_at)?,
    })
}

/// Look up a user by (already normalized) email
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, email, password_hash, role, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn find_user_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, email, password_hash, role, created_at FROM users WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Insert a new user
///
/// Returns `Error::Conflict` if the email is already registered.
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role,
        created_at: time::now(),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(encode_ts(user.created_at))
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(user),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(Error::Conflict("Email already registered".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Create the account as ADMIN, or reset an existing account's password and
/// promote it to ADMIN
pub async fn upsert_admin(pool: &SqlitePool, email: &str, password_hash: &str) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, role, created_at)
        VALUES (?, ?, ?, 'ADMIN', ?)
        ON CONFLICT(email) DO UPDATE SET
            password_hash = excluded.password_hash,
            role = 'ADMIN'
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(email)
    .bind(password_hash)
    .bind(encode_ts(time::now()))
    .execute(pool)
    .await?;

    find_user_by_email(pool, email)
        .await?
        .ok_or_else(|| Error::Internal("Admin user missing after upsert".to_string()))
}

pub async fn set_user_role(pool: &SqlitePool, id: Uuid, role: Role) -> Result<()> {
    let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("User not found".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let pool = init_memory_database().await.unwrap();

        let user = create_user(&pool, "dj@zylo.fm", "hash", Role::Listener)
            .await
            .unwrap();

        let by_email = find_user_by_email(&pool, "dj@zylo.fm").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.role, Role::Listener);

        let by_id = find_user_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "dj@zylo.fm");

        assert!(find_user_by_email(&pool, "nobody@zylo.fm").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let pool = init_memory_database().await.unwrap();
        create_user(&pool, "dup@zylo.fm", "hash", Role::Listener).await.unwrap();

        let err = create_user(&pool, "dup@zylo.fm", "hash2", Role::Dj).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_upsert_admin_promotes_existing() {
        let pool = init_memory_database().await.unwrap();
        let user = create_user(&pool, "boss@zylo.fm", "old", Role::Listener).await.unwrap();

        let admin = upsert_admin(&pool, "boss@zylo.fm", "new").await.unwrap();
        assert_eq!(admin.id, user.id);
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.password_hash, "new");
    }

    #[tokio::test]
    async fn test_set_role() {
        let pool = init_memory_database().await.unwrap();
        let user = create_user(&pool, "x@zylo.fm", "hash", Role::Listener).await.unwrap();

        set_user_role(&pool, user.id, Role::Dj).await.unwrap();
        assert_eq!(find_user_by_id(&pool, user.id).await.unwrap().unwrap().role, Role::Dj);

        assert!(matches!(
            set_user_role(&pool, Uuid::new_v4(), Role::Dj).await,
            Err(Error::NotFound(_))
        ));
    }
}
