//! SQLite-backed assistant library repository
//!
//! Keywords live in a JSON text column and are matched with `json_each`.
//! `search_title` holds the Unicode-lowercased title, since SQLite's
//! `lower()` only folds ASCII.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{decode_list, decode_ts, decode_uuid, encode_list, encode_ts};
use crate::library::{
    LibraryFilter, LibraryPatch, LibraryRepository, NewLibraryItem, RepositoryError,
};
use crate::models::LibraryItem;
use crate::time;

const ITEM_COLUMNS: &str = "id, title, audio_url, keywords, is_active, created_at, updated_at";

/// Library repository over the `assistant_library` table
#[derive(Debug, Clone)]
pub struct SqliteLibrary {
    pool: SqlitePool,
}

impl SqliteLibrary {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A timestamp later than every stored `updated_at`
    async fn next_timestamp(&self) -> Result<DateTime<Utc>, RepositoryError> {
        let latest: Option<String> = sqlx::query_scalar("SELECT MAX(updated_at) FROM assistant_library")
            .fetch_one(&self.pool)
            .await?;

        match latest {
            Some(raw) => Ok(time::now_after(decode_ts(&raw).map_err(storage)?)),
            None => Ok(time::now()),
        }
    }
}

fn storage(err: crate::Error) -> RepositoryError {
    RepositoryError::Storage(err.to_string())
}

fn item_from_row(row: &SqliteRow) -> Result<LibraryItem, RepositoryError> {
    let id: String = row.get("id");
    let keywords: String = row.get("keywords");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(LibraryItem {
        id: decode_uuid(&id).map_err(storage)?,
        title: row.get("title"),
        audio_url: row.get("audio_url"),
        keywords: decode_list(&keywords).map_err(storage)?,
        is_active: row.get("is_active"),
        created_at: decode_ts(&created_at).map_err(storage)?,
        updated_at: decode_ts(&updated_at).map_err(storage)?,
    })
}

#[async_trait]
impl LibraryRepository for SqliteLibrary {
    async fn find_many(&self, filter: &LibraryFilter) -> Result<Vec<LibraryItem>, RepositoryError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM assistant_library WHERE 1 = 1",
            ITEM_COLUMNS
        ));

        if filter.active_only {
            qb.push(" AND is_active = 1");
        }

        if let Some(search) = &filter.search {
            qb.push(" AND (instr(search_title, ");
            qb.push_bind(search.q.clone());
            qb.push(") > 0");

            if !search.tokens.is_empty() {
                qb.push(
                    " OR EXISTS (SELECT 1 FROM json_each(assistant_library.keywords) \
                     WHERE json_each.value IN (",
                );
                let mut values = qb.separated(", ");
                for token in &search.tokens {
                    values.push_bind(token.clone());
                }
                values.push_unseparated("))");
            }
            qb.push(")");
        }

        qb.push(" ORDER BY updated_at DESC, rowid DESC");

        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit as i64);
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn find_unique(&self, id: Uuid) -> Result<Option<LibraryItem>, RepositoryError> {
        let sql = format!("SELECT {} FROM assistant_library WHERE id = ?", ITEM_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn create(&self, new: NewLibraryItem) -> Result<LibraryItem, RepositoryError> {
        let now = self.next_timestamp().await?;
        let item = LibraryItem {
            id: Uuid::new_v4(),
            title: new.title,
            audio_url: new.audio_url,
            keywords: new.keywords,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO assistant_library (
                id, title, search_title, audio_url, keywords, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.to_string())
        .bind(&item.title)
        .bind(item.title.to_lowercase())
        .bind(&item.audio_url)
        .bind(encode_list(&item.keywords))
        .bind(item.is_active)
        .bind(encode_ts(item.created_at))
        .bind(encode_ts(item.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Writes only the fields present in `patch`, plus `updated_at`
    async fn update(&self, id: Uuid, patch: LibraryPatch) -> Result<LibraryItem, RepositoryError> {
        let updated_at = self.next_timestamp().await?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE assistant_library SET updated_at = ");
        qb.push_bind(encode_ts(updated_at));

        if let Some(title) = &patch.title {
            qb.push(", title = ");
            qb.push_bind(title.clone());
            qb.push(", search_title = ");
            qb.push_bind(title.to_lowercase());
        }
        if let Some(keywords) = &patch.keywords {
            qb.push(", keywords = ");
            qb.push_bind(encode_list(keywords));
        }
        if let Some(active) = patch.is_active {
            qb.push(", is_active = ");
            qb.push_bind(active);
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id.to_string());
        qb.push(" RETURNING ");
        qb.push(ITEM_COLUMNS);

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound(id))?;
        item_from_row(&row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM assistant_library WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}
