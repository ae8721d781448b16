use std::path::PathBuf;
use tracing::info;

use super::{connections_dir, document, HISTORY_FILE, SETTINGS_FILE};
use crate::error::AppError;
use crate::models::AppSettings;

/// Global settings singleton at the data root (`settings.json`), plus the
/// one-time migration of the legacy settings-embedded history.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    data_dir: PathBuf,
}

impl SettingsStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn file(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    /// Returns the settings document. A missing or schema-invalid file is
    /// re-initialized to defaults, and the defaults are persisted.
    pub async fn read(&self) -> Result<AppSettings, AppError> {
        match document::read_opt::<AppSettings>(&self.file()).await {
            Some(settings) => Ok(settings),
            None => {
                let defaults = AppSettings::default();
                document::write(&self.file(), &defaults).await?;
                Ok(defaults)
            }
        }
    }

    /// Read-merge-write: fields set on `settings` replace their stored
    /// counterparts; every other key in the document, including keys this
    /// release does not know about, is preserved.
    pub async fn write(&self, settings: &AppSettings) -> Result<(), AppError> {
        let path = self.file();
        let update = serde_json::to_value(settings)?;
        let mut doc = document::read_value(&path)
            .await
            .unwrap_or_else(|| serde_json::json!({}));
        if !doc.is_object() {
            doc = serde_json::json!({});
        }
        if let (Some(existing), Some(fields)) = (doc.as_object_mut(), update.as_object()) {
            for (key, value) in fields {
                existing.insert(key.clone(), value.clone());
            }
        }
        document::write(&path, &doc).await
    }

    /// Moves a history array embedded in the settings document (the legacy
    /// single-connection layout) out to its own `history.json`. Runs at most
    /// once: skipped when the destination already exists or the
    /// `connections/` layout is in place.
    pub async fn migrate_legacy_history(&self) -> Result<(), AppError> {
        if connections_dir(&self.data_dir).exists() {
            return Ok(());
        }
        let destination = self.data_dir.join(HISTORY_FILE);
        if destination.exists() {
            return Ok(());
        }
        let Some(mut doc) = document::read_value(&self.file()).await else {
            return Ok(());
        };
        let Some(fields) = doc.as_object_mut() else {
            return Ok(());
        };
        let Some(history) = fields.remove("history") else {
            return Ok(());
        };
        // The destination is written before the stripped settings document;
        // an interrupted run leaves the embedded copy behind, and later runs
        // skip on the existing destination instead of extracting it again.
        document::write(&destination, &history).await?;
        document::write(&self.file(), &doc).await?;
        info!(
            "Migrated legacy embedded history to {}",
            destination.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AiProvider;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_missing_file_self_heals_to_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());

        let settings = store.read().await.unwrap();
        assert_eq!(settings.ai_provider, AiProvider::OpenAi);

        // The defaults were persisted.
        let raw = tokio::fs::read_to_string(dir.path().join("settings.json"))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["aiProvider"], "openai");
    }

    #[tokio::test]
    async fn test_read_corrupt_file_self_heals() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        tokio::fs::write(dir.path().join("settings.json"), "not json at all")
            .await
            .unwrap();

        let settings = store.read().await.unwrap();
        assert_eq!(settings, AppSettings::default());
        assert!(store.read().await.is_ok());
    }

    #[tokio::test]
    async fn test_write_preserves_unknown_siblings() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        tokio::fs::write(
            dir.path().join("settings.json"),
            r#"{"aiProvider":"openai","connectionString":"postgres://legacy/db"}"#,
        )
        .await
        .unwrap();

        store
            .write(&AppSettings {
                ai_provider: AiProvider::Claude,
                claude_api_key: Some("sk-ant-test".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let raw = tokio::fs::read_to_string(dir.path().join("settings.json"))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["aiProvider"], "claude");
        assert_eq!(value["claudeApiKey"], "sk-ant-test");
        assert_eq!(value["connectionString"], "postgres://legacy/db");
    }

    #[tokio::test]
    async fn test_migration_extracts_embedded_history() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        tokio::fs::write(
            dir.path().join("settings.json"),
            r#"{"aiProvider":"openai","history":[{"id":"1","query":"SELECT 1","results":[],"timestamp":"2024-01-15T10:00:00Z"}]}"#,
        )
        .await
        .unwrap();

        store.migrate_legacy_history().await.unwrap();

        let history = tokio::fs::read_to_string(dir.path().join("history.json"))
            .await
            .unwrap();
        let entries: serde_json::Value = serde_json::from_str(&history).unwrap();
        assert_eq!(entries.as_array().unwrap().len(), 1);

        let settings = tokio::fs::read_to_string(dir.path().join("settings.json"))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&settings).unwrap();
        assert!(value.get("history").is_none());
        assert_eq!(value["aiProvider"], "openai");
    }

    #[tokio::test]
    async fn test_migration_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        tokio::fs::write(
            dir.path().join("settings.json"),
            r#"{"history":[{"id":"1","query":"SELECT 1","results":[],"timestamp":"2024-01-15T10:00:00Z"}]}"#,
        )
        .await
        .unwrap();

        store.migrate_legacy_history().await.unwrap();
        let after_first = tokio::fs::read_to_string(dir.path().join("history.json"))
            .await
            .unwrap();

        store.migrate_legacy_history().await.unwrap();
        let after_second = tokio::fs::read_to_string(dir.path().join("history.json"))
            .await
            .unwrap();

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_migration_skips_when_destination_exists() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let source = r#"{"history":[{"id":"1","query":"SELECT 1","results":[],"timestamp":"2024-01-15T10:00:00Z"}]}"#;
        tokio::fs::write(dir.path().join("settings.json"), source)
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("history.json"), "[]")
            .await
            .unwrap();

        store.migrate_legacy_history().await.unwrap();

        // Source document untouched, destination untouched.
        let settings = tokio::fs::read_to_string(dir.path().join("settings.json"))
            .await
            .unwrap();
        assert_eq!(settings, source);
        let history = tokio::fs::read_to_string(dir.path().join("history.json"))
            .await
            .unwrap();
        assert_eq!(history, "[]");
    }

    #[tokio::test]
    async fn test_migration_skips_under_multi_connection_layout() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let source = r#"{"history":[]}"#;
        tokio::fs::write(dir.path().join("settings.json"), source)
            .await
            .unwrap();
        tokio::fs::create_dir_all(dir.path().join("connections/prod"))
            .await
            .unwrap();

        store.migrate_legacy_history().await.unwrap();

        assert!(!dir.path().join("history.json").exists());
        let settings = tokio::fs::read_to_string(dir.path().join("settings.json"))
            .await
            .unwrap();
        assert_eq!(settings, source);
    }
}
