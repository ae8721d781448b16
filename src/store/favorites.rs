use std::path::PathBuf;
use tracing::debug;

use super::{connection_dir, document, FAVORITES_FILE};
use crate::error::AppError;
use crate::models::{EntryPatch, QueryLogEntry};

/// Unbounded per-connection favorites, backed by
/// `connections/<name>/favorites.json`. Entries carry the same shape as
/// history entries; favoriting copies an entry here without removing it from
/// history.
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    data_dir: PathBuf,
}

impl FavoritesStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn file(&self, connection_name: &str) -> PathBuf {
        connection_dir(&self.data_dir, connection_name).join(FAVORITES_FILE)
    }

    /// Returns the favorites, newest addition first. A missing or malformed
    /// document is re-initialized to empty rather than reported.
    pub async fn list(&self, connection_name: &str) -> Result<Vec<QueryLogEntry>, AppError> {
        let path = self.file(connection_name);
        match document::read_opt(&path).await {
            Some(entries) => Ok(entries),
            None => {
                let empty: Vec<QueryLogEntry> = Vec::new();
                document::write(&path, &empty).await?;
                Ok(empty)
            }
        }
    }

    /// Inserts the entry at the head. No size cap applies.
    pub async fn add(&self, connection_name: &str, entry: QueryLogEntry) -> Result<(), AppError> {
        let path = self.file(connection_name);
        let mut entries: Vec<QueryLogEntry> = document::read_opt(&path).await.unwrap_or_default();
        entries.insert(0, entry);
        document::write(&path, &entries).await?;
        debug!(
            "Added favorite for {} ({} stored)",
            connection_name,
            entries.len()
        );
        Ok(())
    }

    /// Removes the entry with the given id. An unmatched id leaves the
    /// collection untouched and is not an error.
    pub async fn remove(&self, connection_name: &str, id: &str) -> Result<(), AppError> {
        let path = self.file(connection_name);
        let mut entries: Vec<QueryLogEntry> = document::read_opt(&path).await.unwrap_or_default();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(());
        }
        document::write(&path, &entries).await
    }

    /// Merges a partial update into the entry with the given id. An unmatched
    /// id is a no-op, as for removal.
    pub async fn update(
        &self,
        connection_name: &str,
        id: &str,
        patch: EntryPatch,
    ) -> Result<(), AppError> {
        let path = self.file(connection_name);
        let mut entries: Vec<QueryLogEntry> = document::read_opt(&path).await.unwrap_or_default();
        match entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.apply(patch);
                document::write(&path, &entries).await
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(id: usize) -> QueryLogEntry {
        QueryLogEntry {
            id: id.to_string(),
            query: format!("SELECT {}", id),
            results: vec![],
            graph: None,
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_add_is_unbounded() {
        let dir = tempdir().unwrap();
        let store = FavoritesStore::new(dir.path());

        for i in 0..25 {
            store.add("prod", entry(i)).await.unwrap();
        }

        let entries = store.list("prod").await.unwrap();
        assert_eq!(entries.len(), 25);
        assert_eq!(entries[0].id, "24");
    }

    #[tokio::test]
    async fn test_remove_deletes_entry() {
        let dir = tempdir().unwrap();
        let store = FavoritesStore::new(dir.path());
        store.add("prod", entry(1)).await.unwrap();
        store.add("prod", entry(2)).await.unwrap();

        store.remove("prod", "1").await.unwrap();

        let entries = store.list("prod").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "2");
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_noop() {
        let dir = tempdir().unwrap();
        let store = FavoritesStore::new(dir.path());
        store.add("prod", entry(1)).await.unwrap();

        store.remove("prod", "nonexistent-id").await.unwrap();

        assert_eq!(store.list("prod").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_refreshes_results() {
        let dir = tempdir().unwrap();
        let store = FavoritesStore::new(dir.path());
        store.add("prod", entry(1)).await.unwrap();

        store
            .update(
                "prod",
                "1",
                EntryPatch {
                    results: Some(vec![serde_json::json!({"value": 42})]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let entries = store.list("prod").await.unwrap();
        assert_eq!(entries[0].results[0]["value"], 42);
    }
}
