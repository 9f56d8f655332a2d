//! DJ profile queries

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{decode_list, decode_ts, decode_uuid, encode_list, encode_ts};
use crate::models::{DjProfile, DjProfileWithUser, DjStatus, UserSummary};
use crate::{time, Error, Result};

const PROFILE_COLUMNS: &str = "p.id, p.user_id, p.display_name, p.bio, p.location, p.genres, \
                               p.status, p.created_at, p.updated_at";

/// Fields for a new DJ profile
#[derive(Debug, Clone)]
pub struct NewDjProfile {
    pub user_id: Uuid,
    pub display_name: String,
    pub bio: String,
    pub location: Option<String>,
    pub genres: Vec<String>,
    pub status: DjStatus,
}

/// Partial profile update; `None` leaves a field untouched
///
/// `location: Some(None)` clears the location.
#[derive(Debug, Clone, Default)]
pub struct DjProfilePatch {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<Option<String>>,
    pub genres: Option<Vec<String>>,
}

fn profile_from_row(row: &SqliteRow) -> Result<DjProfile> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let genres: String = row.get("genres");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(DjProfile {
        id: decode_uuid(&id)?,
        user_id: decode_uuid(&user_id)?,
        display_name: row.get("display_name"),
        bio: row.get("bio"),
        location: row.get("location"),
        genres: decode_list(&genres)?,
        status: status.parse()?,
        created_at: decode_ts(&created_at)?,
        updated_at: decode_ts(&updated_at)?,
    })
}

/// Insert a profile
///
/// Returns `Error::Conflict` if the user already has one.
pub async fn create_dj_profile(pool: &SqlitePool, new: NewDjProfile) -> Result<DjProfile> {
    let now = time::now();
    let profile = DjProfile {
        id: Uuid::new_v4(),
        user_id: new.user_id,
        display_name: new.display_name,
        bio: new.bio,
        location: new.location,
        genres: new.genres,
        status: new.status,
        created_at: now,
        updated_at: now,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO dj_profiles (
            id, user_id, display_name, bio, location, genres, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(profile.id.to_string())
    .bind(profile.user_id.to_string())
    .bind(&profile.display_name)
    .bind(&profile.bio)
    .bind(&profile.location)
    .bind(encode_list(&profile.genres))
    .bind(profile.status.as_str())
    .bind(encode_ts(now))
    .bind(encode_ts(now))
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(profile),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(Error::Conflict("DJ profile already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn find_dj_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<DjProfile>> {
    let sql = format!("SELECT {} FROM dj_profiles p WHERE p.id = ?", PROFILE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(profile_from_row).transpose()
}

pub async fn find_dj_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Option<DjProfile>> {
    let sql = format!("SELECT {} FROM dj_profiles p WHERE p.user_id = ?", PROFILE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(profile_from_row).transpose()
}

/// Apply `patch` to profile `id`
pub async fn update_dj_profile(
    pool: &SqlitePool,
    id: Uuid,
    patch: DjProfilePatch,
) -> Result<DjProfile> {
    let mut profile = find_dj_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound("DJ profile not found".to_string()))?;

    if let Some(name) = patch.display_name {
        profile.display_name = name;
    }
    if let Some(bio) = patch.bio {
        profile.bio = bio;
    }
    if let Some(location) = patch.location {
        profile.location = location;
    }
    if let Some(genres) = patch.genres {
        profile.genres = genres;
    }
    profile.updated_at = time::now();

    sqlx::query(
        r#"
        UPDATE dj_profiles
        SET display_name = ?, bio = ?, location = ?, genres = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&profile.display_name)
    .bind(&profile.bio)
    .bind(&profile.location)
    .bind(encode_list(&profile.genres))
    .bind(encode_ts(profile.updated_at))
    .bind(profile.id.to_string())
    .execute(pool)
    .await?;

    Ok(profile)
}

/// Approved profiles, newest first
pub async fn list_approved_djs(pool: &SqlitePool) -> Result<Vec<DjProfile>> {
    let sql = format!(
        "SELECT {} FROM dj_profiles p WHERE p.status = 'APPROVED' ORDER BY p.created_at DESC",
        PROFILE_COLUMNS
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter().map(profile_from_row).collect()
}

/// Profiles with their owning user, optionally filtered by status, newest first
pub async fn list_djs_with_user(
    pool: &SqlitePool,
    status: Option<DjStatus>,
) -> Result<Vec<DjProfileWithUser>> {
    let mut sql = format!(
        "SELECT {}, u.email AS user_email, u.role AS user_role \
         FROM dj_profiles p JOIN users u ON u.id = p.user_id",
        PROFILE_COLUMNS
    );
    if status.is_some() {
        sql.push_str(" WHERE p.status = ?");
    }
    sql.push_str(" ORDER BY p.created_at DESC");

    let mut query = sqlx::query(&sql);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }
    let rows = query.fetch_all(pool).await?;

    rows.iter()
        .map(|row| {
            let profile = profile_from_row(row)?;
            let role: String = row.get("user_role");
            Ok(DjProfileWithUser {
                user: UserSummary {
                    id: profile.user_id,
                    email: row.get("user_email"),
                    role: role.parse()?,
                },
                profile,
            })
        })
        .collect()
}

/// Set moderation status, returning the updated profile
pub async fn set_dj_status(pool: &SqlitePool, id: Uuid, status: DjStatus) -> Result<DjProfile> {
    let result = sqlx::query("UPDATE dj_profiles SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(encode_ts(time::now()))
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("DJ not found".to_string()));
    }

    find_dj_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound("DJ not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use crate::db::users::create_user;
    use crate::models::Role;

    async fn profile_for(pool: &SqlitePool, email: &str, status: DjStatus) -> DjProfile {
        let user = create_user(pool, email, "hash", Role::Dj).await.unwrap();
        create_dj_profile(
            pool,
            NewDjProfile {
                user_id: user.id,
                display_name: format!("DJ {}", email),
                bio: String::new(),
                location: None,
                genres: vec!["house".to_string()],
                status,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let pool = init_memory_database().await.unwrap();
        let profile = profile_for(&pool, "a@zylo.fm", DjStatus::Pending).await;

        let by_user = find_dj_by_user(&pool, profile.user_id).await.unwrap().unwrap();
        assert_eq!(by_user.id, profile.id);
        assert_eq!(by_user.genres, vec!["house"]);

        let by_id = find_dj_by_id(&pool, profile.id).await.unwrap().unwrap();
        assert_eq!(by_id.status, DjStatus::Pending);
    }

    #[tokio::test]
    async fn test_second_profile_conflicts() {
        let pool = init_memory_database().await.unwrap();
        let profile = profile_for(&pool, "a@zylo.fm", DjStatus::Pending).await;

        let err = create_dj_profile(
            &pool,
            NewDjProfile {
                user_id: profile.user_id,
                display_name: "Again".to_string(),
                bio: String::new(),
                location: None,
                genres: vec![],
                status: DjStatus::Pending,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_applies_only_supplied_fields() {
        let pool = init_memory_database().await.unwrap();
        let profile = profile_for(&pool, "a@zylo.fm", DjStatus::Approved).await;

        let updated = update_dj_profile(
            &pool,
            profile.id,
            DjProfilePatch {
                bio: Some("Late night grooves".to_string()),
                location: Some(Some("Lima".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.display_name, profile.display_name);
        assert_eq!(updated.bio, "Late night grooves");
        assert_eq!(updated.location.as_deref(), Some("Lima"));
        assert_eq!(updated.genres, profile.genres);
    }

    #[tokio::test]
    async fn test_status_filters() {
        let pool = init_memory_database().await.unwrap();
        let pending = profile_for(&pool, "p@zylo.fm", DjStatus::Pending).await;
        profile_for(&pool, "a@zylo.fm", DjStatus::Approved).await;

        assert_eq!(list_approved_djs(&pool).await.unwrap().len(), 1);
        assert_eq!(list_djs_with_user(&pool, None).await.unwrap().len(), 2);

        let only_pending = list_djs_with_user(&pool, Some(DjStatus::Pending)).await.unwrap();
        assert_eq!(only_pending.len(), 1);
        assert_eq!(only_pending[0].user.email, "p@zylo.fm");

        let blocked = set_dj_status(&pool, pending.id, DjStatus::Blocked).await.unwrap();
        assert_eq!(blocked.status, DjStatus::Blocked);

        assert!(matches!(
            set_dj_status(&pool, Uuid::new_v4(), DjStatus::Approved).await,
            Err(Error::NotFound(_))
        ));
    }
}
