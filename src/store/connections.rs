use std::path::PathBuf;
use tracing::info;

use super::{connection_dir, connections_dir, document, FAVORITES_FILE, HISTORY_FILE, SETTINGS_FILE};
use crate::error::AppError;
use crate::models::{ConnectionSettings, QueryLogEntry};
use crate::services::database::Dialect;

/// Durable per-connection settings. A connection exists exactly when its
/// `connections/<name>/settings.json` document does; the sibling history and
/// favorites documents are auxiliary and re-initializable.
#[derive(Debug, Clone)]
pub struct ConnectionStore {
    data_dir: PathBuf,
}

impl ConnectionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn dir(&self, name: &str) -> PathBuf {
        connection_dir(&self.data_dir, name)
    }

    fn settings_file(&self, name: &str) -> PathBuf {
        self.dir(name).join(SETTINGS_FILE)
    }

    /// Connection names double as directory names, so path-hostile names are
    /// rejected before any filesystem operation.
    fn validate_name(name: &str) -> Result<(), AppError> {
        if name.trim().is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(AppError::Validation(format!(
                "invalid connection name: {:?}",
                name
            )));
        }
        Ok(())
    }

    /// Persists a new connection and initializes its empty history and
    /// favorites collections.
    pub async fn create(&self, name: &str, settings: ConnectionSettings) -> Result<(), AppError> {
        Self::validate_name(name)?;
        if self.settings_file(name).exists() {
            return Err(AppError::AlreadyExists(name.to_string()));
        }
        document::write(&self.settings_file(name), &settings.normalized()).await?;
        let empty: Vec<QueryLogEntry> = Vec::new();
        document::write(&self.dir(name).join(HISTORY_FILE), &empty).await?;
        document::write(&self.dir(name).join(FAVORITES_FILE), &empty).await?;
        info!("Created connection {}", name);
        Ok(())
    }

    /// Replaces the settings document wholesale. History and favorites are
    /// untouched.
    pub async fn edit(&self, name: &str, settings: ConnectionSettings) -> Result<(), AppError> {
        Self::validate_name(name)?;
        if !self.settings_file(name).exists() {
            return Err(AppError::NotFound(name.to_string()));
        }
        document::write(&self.settings_file(name), &settings.normalized()).await?;
        info!("Updated connection {}", name);
        Ok(())
    }

    /// A missing or unreadable settings document is reported as `NotFound`,
    /// never healed: fabricating a connection string would be unsafe.
    pub async fn get(&self, name: &str) -> Result<ConnectionSettings, AppError> {
        document::read_opt(&self.settings_file(name))
            .await
            .ok_or_else(|| AppError::NotFound(name.to_string()))
    }

    /// All known connection names, sorted for a stable order. An absent
    /// `connections/` directory means no connections yet, not an error.
    pub async fn list(&self) -> Result<Vec<String>, AppError> {
        let dir = connections_dir(&self.data_dir);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if entry.path().join(SETTINGS_FILE).exists() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Removes the connection directory, cascading to its history and
    /// favorites.
    pub async fn delete(&self, name: &str) -> Result<(), AppError> {
        Self::validate_name(name)?;
        if !self.settings_file(name).exists() {
            return Err(AppError::NotFound(name.to_string()));
        }
        tokio::fs::remove_dir_all(self.dir(name)).await?;
        info!("Deleted connection {} and its history/favorites", name);
        Ok(())
    }

    pub async fn prompt_extension(&self, name: &str) -> Result<Option<String>, AppError> {
        Ok(self.get(name).await?.prompt_extension)
    }

    pub async fn connection_string(&self, name: &str) -> Result<String, AppError> {
        Ok(self.get(name).await?.connection_string)
    }

    pub async fn dialect(&self, name: &str) -> Result<Dialect, AppError> {
        Dialect::infer(&self.connection_string(name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn settings(url: &str) -> ConnectionSettings {
        ConnectionSettings::new(url.to_string(), None)
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = ConnectionStore::new(dir.path());
        let input = ConnectionSettings::new(
            "postgresql://u:p@localhost:5432/app".to_string(),
            Some("prefer ISO dates".to_string()),
        );

        store.create("prod", input.clone()).await.unwrap();

        assert_eq!(store.get("prod").await.unwrap(), input);
    }

    #[tokio::test]
    async fn test_create_duplicate_fails() {
        let dir = tempdir().unwrap();
        let store = ConnectionStore::new(dir.path());
        store
            .create("prod", settings("postgres://h/db"))
            .await
            .unwrap();

        let err = store
            .create("prod", settings("mysql://h/db"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(name) if name == "prod"));
    }

    #[tokio::test]
    async fn test_create_initializes_empty_collections() {
        let dir = tempdir().unwrap();
        let store = ConnectionStore::new(dir.path());
        store
            .create("prod", settings("postgres://h/db"))
            .await
            .unwrap();

        let base = dir.path().join("connections/prod");
        for file in ["history.json", "favorites.json"] {
            let content = tokio::fs::read_to_string(base.join(file)).await.unwrap();
            let value: serde_json::Value = serde_json::from_str(&content).unwrap();
            assert_eq!(value, serde_json::json!([]));
        }
    }

    #[tokio::test]
    async fn test_edit_replaces_wholesale() {
        let dir = tempdir().unwrap();
        let store = ConnectionStore::new(dir.path());
        store
            .create(
                "prod",
                ConnectionSettings::new(
                    "postgres://h/db".to_string(),
                    Some("old note".to_string()),
                ),
            )
            .await
            .unwrap();

        store
            .edit("prod", settings("postgres://other/db"))
            .await
            .unwrap();

        let stored = store.get("prod").await.unwrap();
        assert_eq!(stored.connection_string, "postgres://other/db");
        assert!(stored.prompt_extension.is_none());
    }

    #[tokio::test]
    async fn test_edit_missing_fails() {
        let dir = tempdir().unwrap();
        let store = ConnectionStore::new(dir.path());
        let err = store
            .edit("ghost", settings("postgres://h/db"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_recreate_starts_empty() {
        let dir = tempdir().unwrap();
        let store = ConnectionStore::new(dir.path());
        let history = crate::store::HistoryStore::new(dir.path());
        let favorites = crate::store::FavoritesStore::new(dir.path());

        store
            .create("x", settings("postgres://h/db"))
            .await
            .unwrap();
        history
            .append("x", QueryLogEntry::new("SELECT 1".to_string(), vec![], None))
            .await
            .unwrap();
        favorites
            .add("x", QueryLogEntry::new("SELECT 2".to_string(), vec![], None))
            .await
            .unwrap();

        store.delete("x").await.unwrap();
        assert!(matches!(
            store.get("x").await.unwrap_err(),
            AppError::NotFound(_)
        ));

        store
            .create("x", settings("postgres://h/db"))
            .await
            .unwrap();
        assert!(history.list("x").await.unwrap().is_empty());
        assert!(favorites.list("x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_fails() {
        let dir = tempdir().unwrap();
        let store = ConnectionStore::new(dir.path());
        assert!(matches!(
            store.delete("ghost").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_tolerates_missing_dir() {
        let dir = tempdir().unwrap();
        let store = ConnectionStore::new(dir.path());
        assert!(store.list().await.unwrap().is_empty());

        for name in ["staging", "analytics", "prod"] {
            store
                .create(name, settings("postgres://h/db"))
                .await
                .unwrap();
        }
        assert_eq!(store.list().await.unwrap(), ["analytics", "prod", "staging"]);
    }

    #[tokio::test]
    async fn test_whitespace_prompt_extension_stored_absent() {
        let dir = tempdir().unwrap();
        let store = ConnectionStore::new(dir.path());
        store
            .create(
                "prod",
                ConnectionSettings::new("postgres://h/db".to_string(), Some("   ".to_string())),
            )
            .await
            .unwrap();

        assert!(store.prompt_extension("prod").await.unwrap().is_none());

        let raw = tokio::fs::read_to_string(dir.path().join("connections/prod/settings.json"))
            .await
            .unwrap();
        assert!(!raw.contains("promptExtension"));
    }

    #[tokio::test]
    async fn test_path_hostile_names_rejected() {
        let dir = tempdir().unwrap();
        let store = ConnectionStore::new(dir.path());
        for name in ["", "..", "a/b", "a\\b"] {
            let err = store
                .create(name, settings("postgres://h/db"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "accepted {:?}", name);
        }
    }
}
