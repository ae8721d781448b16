use serde::{Deserialize, Serialize};

/// Per-connection settings document, stored at
/// `connections/<name>/settings.json`. The connection's identity is the
/// directory name, never a field of the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    pub connection_string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_extension: Option<String>,
}

impl ConnectionSettings {
    pub fn new(connection_string: String, prompt_extension: Option<String>) -> Self {
        Self {
            connection_string,
            prompt_extension,
        }
        .normalized()
    }

    /// A whitespace-only prompt extension carries no instructions and is
    /// stored as absent.
    pub fn normalized(mut self) -> Self {
        if let Some(ext) = &self.prompt_extension {
            if ext.trim().is_empty() {
                self.prompt_extension = None;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_prompt_extension_normalizes_to_absent() {
        let settings =
            ConnectionSettings::new("postgres://localhost/db".to_string(), Some("  \n\t ".to_string()));
        assert!(settings.prompt_extension.is_none());
    }

    #[test]
    fn test_real_prompt_extension_survives() {
        let settings = ConnectionSettings::new(
            "postgres://localhost/db".to_string(),
            Some("prefer ISO dates".to_string()),
        );
        assert_eq!(settings.prompt_extension.as_deref(), Some("prefer ISO dates"));
    }

    #[test]
    fn test_absent_prompt_extension_omitted_from_json() {
        let settings = ConnectionSettings::new("mysql://localhost/db".to_string(), None);
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("connectionString"));
        assert!(!json.contains("promptExtension"));
    }
}
