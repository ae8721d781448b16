use serde::{Deserialize, Serialize};

/// Global application settings, stored at the data root's `settings.json`.
/// Unknown sibling keys left behind by older releases are preserved by the
/// store's merge-on-write; this struct only names the fields the application
/// reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub ai_provider: AiProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_ai_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_ai_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_ai_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_model: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    OpenAi,
    Claude,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_provider_is_openai() {
        assert_eq!(AppSettings::default().ai_provider, AiProvider::OpenAi);
    }

    #[test]
    fn test_provider_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AiProvider::OpenAi).unwrap(),
            r#""openai""#
        );
        assert_eq!(
            serde_json::to_string(&AiProvider::Claude).unwrap(),
            r#""claude""#
        );
    }

    #[test]
    fn test_settings_parse_tolerates_missing_provider() {
        let settings: AppSettings = serde_json::from_str(r#"{"openAiKey":"sk-test"}"#).unwrap();
        assert_eq!(settings.ai_provider, AiProvider::OpenAi);
        assert_eq!(settings.open_ai_key.as_deref(), Some("sk-test"));
    }
}
