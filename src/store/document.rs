use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

use crate::error::AppError;

/// Reads a JSON document, returning `None` when the file is missing or its
/// content does not parse into `T`. Parse failures are logged; the caller
/// decides whether to self-heal or surface the miss.
pub async fn read_opt<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Malformed document at {}: {}", path.display(), e);
            None
        }
    }
}

/// Reads a document as raw JSON without schema expectations.
pub async fn read_value(path: &Path) -> Option<serde_json::Value> {
    read_opt(path).await
}

/// Serializes and writes a whole document: content goes to a sibling temp
/// file first, then a rename replaces the destination, so a concurrent
/// reader never observes a torn write.
pub async fn write<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let content = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_opt_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let value: Option<serde_json::Value> = read_opt(&dir.path().join("absent.json")).await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_read_opt_malformed_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let value: Option<serde_json::Value> = read_opt(&path).await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_write_replaces_and_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deep/doc.json");

        write(&path, &serde_json::json!({"version": 1})).await.unwrap();
        write(&path, &serde_json::json!({"version": 2})).await.unwrap();

        let value: serde_json::Value = read_opt(&path).await.unwrap();
        assert_eq!(value["version"], 2);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
