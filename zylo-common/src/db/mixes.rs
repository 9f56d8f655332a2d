//! Mix queries
//!
//! Every read joins the owning profile so views carry the DJ's display name.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{decode_ts, decode_uuid, encode_ts};
use crate::models::{Mix, MixStatus};
use crate::{time, Error, Result};

const MIX_SELECT: &str = "SELECT m.id, m.dj_id, d.display_name AS dj_name, m.title, m.description, \
                          m.genre, m.audio_url, m.cover_url, m.status, m.is_clean, m.created_at \
                          FROM mixes m LEFT JOIN dj_profiles d ON d.id = m.dj_id";

/// Fields for a new mix
#[derive(Debug, Clone)]
pub struct NewMix {
    pub dj_id: Uuid,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub audio_url: String,
    pub cover_url: String,
    pub is_clean: bool,
}

fn mix_from_row(row: &SqliteRow) -> Result<Mix> {
    let id: String = row.get("id");
    let dj_id: String = row.get("dj_id");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");

    Ok(Mix {
        id: decode_uuid(&id)?,
        dj_id: decode_uuid(&dj_id)?,
        dj_name: row.get("dj_name"),
        title: row.get("title"),
        description: row.get("description"),
        genre: row.get("genre"),
        audio_url: row.get("audio_url"),
        cover_url: row.get("cover_url"),
        status: status.parse()?,
        is_clean: row.get("is_clean"),
        created_at: decode_ts(&created_at)?,
    })
}

async fn fetch_mixes(pool: &SqlitePool, filter: &str, binds: &[String]) -> Result<Vec<Mix>> {
    let sql = format!("{} WHERE {} ORDER BY m.created_at DESC", MIX_SELECT, filter);
    let mut query = sqlx::query(&sql);
    for value in binds {
        query = query.bind(value);
    }
    let rows = query.fetch_all(pool).await?;

    rows.iter().map(mix_from_row).collect()
}

/// Insert a mix in PENDING status
pub async fn create_mix(pool: &SqlitePool, new: NewMix) -> Result<Mix> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO mixes (
            id, dj_id, title, description, genre, audio_url, cover_url, status, is_clean, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(new.dj_id.to_string())
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.genre)
    .bind(&new.audio_url)
    .bind(&new.cover_url)
    .bind(MixStatus::Pending.as_str())
    .bind(new.is_clean)
    .bind(encode_ts(time::now()))
    .execute(pool)
    .await?;

    find_mix(pool, id)
        .await?
        .ok_or_else(|| Error::Internal("Mix missing after insert".to_string()))
}

pub async fn find_mix(pool: &SqlitePool, id: Uuid) -> Result<Option<Mix>> {
    let sql = format!("{} WHERE m.id = ?", MIX_SELECT);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(mix_from_row).transpose()
}

/// Set review status, returning the updated mix
pub async fn set_mix_status(pool: &SqlitePool, id: Uuid, status: MixStatus) -> Result<Mix> {
    let result = sqlx::query("UPDATE mixes SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Mix not found".to_string()));
    }

    find_mix(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound("Mix not found".to_string()))
}

/// Mixes in `status`, newest first
pub async fn list_mixes_by_status(pool: &SqlitePool, status: MixStatus) -> Result<Vec<Mix>> {
    fetch_mixes(pool, "m.status = ?", &[status.as_str().to_string()]).await
}

/// Mixes belonging to `dj_id`, newest first
///
/// `approved_only` hides PENDING and REJECTED mixes from non-owners.
pub async fn list_mixes_for_dj(
    pool: &SqlitePool,
    dj_id: Uuid,
    approved_only: bool,
) -> Result<Vec<Mix>> {
    if approved_only {
        fetch_mixes(
            pool,
            "m.dj_id = ? AND m.status = ?",
            &[dj_id.to_string(), MixStatus::Approved.as_str().to_string()],
        )
        .await
    } else {
        fetch_mixes(pool, "m.dj_id = ?", &[dj_id.to_string()]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::djs::{create_dj_profile, NewDjProfile};
    use crate::db::init_memory_database;
    use crate::db::users::create_user;
    use crate::models::{DjStatus, Role};

    async fn setup() -> (SqlitePool, Uuid) {
        let pool = init_memory_database().await.unwrap();
        let user = create_user(&pool, "dj@zylo.fm", "hash", Role::Dj).await.unwrap();
        let profile = create_dj_profile(
            &pool,
            NewDjProfile {
                user_id: user.id,
                display_name: "DJ Nova".to_string(),
                bio: String::new(),
                location: None,
                genres: vec![],
                status: DjStatus::Approved,
            },
        )
        .await
        .unwrap();
        (pool, profile.id)
    }

    fn new_mix(dj_id: Uuid, title: &str) -> NewMix {
        NewMix {
            dj_id,
            title: title.to_string(),
            description: String::new(),
            genre: "house".to_string(),
            audio_url: "https://cdn.test/a.mp3".to_string(),
            cover_url: "https://cdn.test/c.png".to_string(),
            is_clean: true,
        }
    }

    #[tokio::test]
    async fn test_create_mix_is_pending_with_dj_name() {
        let (pool, dj_id) = setup().await;
        let mix = create_mix(&pool, new_mix(dj_id, "Sunset")).await.unwrap();

        assert_eq!(mix.status, MixStatus::Pending);
        assert_eq!(mix.dj_name.as_deref(), Some("DJ Nova"));
        assert!(mix.is_clean);
    }

    #[tokio::test]
    async fn test_status_transitions_and_listing() {
        let (pool, dj_id) = setup().await;
        let a = create_mix(&pool, new_mix(dj_id, "A")).await.unwrap();
        let b = create_mix(&pool, new_mix(dj_id, "B")).await.unwrap();

        set_mix_status(&pool, a.id, MixStatus::Approved).await.unwrap();

        let pending = list_mixes_by_status(&pool, MixStatus::Pending).await.unwrap();
        assert_eq!(pending.iter().map(|m| m.id).collect::<Vec<_>>(), vec![b.id]);

        let public = list_mixes_for_dj(&pool, dj_id, true).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, a.id);

        assert_eq!(list_mixes_for_dj(&pool, dj_id, false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_mix() {
        let (pool, _) = setup().await;
        assert!(find_mix(&pool, Uuid::new_v4()).await.unwrap().is_none());
        assert!(matches!(
            set_mix_status(&pool, Uuid::new_v4(), MixStatus::Rejected).await,
            Err(Error::NotFound(_))
        ));
    }
}
