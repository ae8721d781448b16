use std::path::PathBuf;
use tracing::debug;

use super::{connection_dir, document, HISTORY_FILE};
use crate::error::AppError;
use crate::models::{EntryPatch, QueryLogEntry};

/// Hard cap on stored history entries per connection; appends beyond it evict
/// the oldest entries.
pub const HISTORY_LIMIT: usize = 20;

/// Bounded per-connection query history, most recent first, backed by
/// `connections/<name>/history.json`. The document is always replaced as a
/// whole, never patched in place.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    data_dir: PathBuf,
}

impl HistoryStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn file(&self, connection_name: &str) -> PathBuf {
        connection_dir(&self.data_dir, connection_name).join(HISTORY_FILE)
    }

    /// Returns the recorded history, most recent first. A missing or
    /// malformed document is re-initialized to empty rather than reported.
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

    /// Inserts the entry at the head, truncates to [`HISTORY_LIMIT`], and
    /// replaces the document on disk.
    pub async fn append(
        &self,
        connection_name: &str,
        entry: QueryLogEntry,
    ) -> Result<(), AppError> {
        let path = self.file(connection_name);
        let mut entries: Vec<QueryLogEntry> = document::read_opt(&path).await.unwrap_or_default();
        entries.insert(0, entry);
        entries.truncate(HISTORY_LIMIT);
        document::write(&path, &entries).await?;
        debug!(
            "Appended history entry for {} ({} stored)",
            connection_name,
            entries.len()
        );
        Ok(())
    }

    /// Merges a partial update into the entry with the given id. An unmatched
    /// id leaves the collection untouched and is not an error.
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
