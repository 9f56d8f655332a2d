//! In-memory library repository

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LibraryFilter, LibraryPatch, LibraryRepository, NewLibraryItem, RepositoryError};
use crate::models::LibraryItem;
use crate::time;

/// Library held in a `Vec`, insertion order kept
///
/// Recency ties resolve to the later insertion, matching the SQLite
/// repository's `rowid DESC` secondary order.
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    items: RwLock<Vec<LibraryItem>>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing items (oldest insertion first)
    pub fn with_items(items: Vec<LibraryItem>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl LibraryRepository for InMemoryLibrary {
    async fn find_many(&self, filter: &LibraryFilter) -> Result<Vec<LibraryItem>, RepositoryError> {
        let items = self.items.read().await;

        let mut selected: Vec<LibraryItem> = items
            .iter()
            .rev()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        if let Some(limit) = filter.limit {
            selected.truncate(limit);
        }
        Ok(selected)
    }

    async fn find_unique(&self, id: Uuid) -> Result<Option<LibraryItem>, RepositoryError> {
        Ok(self.items.read().await.iter().find(|i| i.id == id).cloned())
    }

    async fn create(&self, new: NewLibraryItem) -> Result<LibraryItem, RepositoryError> {
        let mut items = self.items.write().await;

        let now = match items.iter().map(|i| i.updated_at).max() {
            Some(latest) => time::now_after(latest),
            None => time::now(),
        };
        let item = LibraryItem {
            id: Uuid::new_v4(),
            title: new.title,
            audio_url: new.audio_url,
            keywords: new.keywords,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        items.push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: Uuid, patch: LibraryPatch) -> Result<LibraryItem, RepositoryError> {
        let mut items = self.items.write().await;

        let latest = items.iter().map(|i| i.updated_at).max();
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(RepositoryError::NotFound(id))?;

        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(keywords) = patch.keywords {
            item.keywords = keywords;
        }
        if let Some(active) = patch.is_active {
            item.is_active = active;
        }
        item.updated_at = latest.map(time::now_after).unwrap_or_else(time::now);

        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}
