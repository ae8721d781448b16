// Natural-language query generation against OpenAI or Claude, selected by
// the stored application settings at call time.
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::error::AppError;
use crate::models::{AiProvider, AppSettings, GeneratedQuery};
use crate::services::database::Dialect;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const CLAUDE_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-sonnet-latest";
const CLAUDE_MAX_TOKENS: u32 = 4096;

/// Everything the model needs beyond the user's words.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub dialect: Dialect,
    pub schema_ddl: String,
    pub prompt_extension: Option<String>,
    pub current_query: Option<String>,
}

pub struct AiService {
    client: reqwest::Client,
}

impl AiService {
    pub fn new(config: &AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Asks the configured provider for a query. Provider and credentials
    /// come from `settings` so edits take effect without a restart.
    pub async fn generate(
        &self,
        settings: &AppSettings,
        context: &GenerationContext,
        prompt: &str,
    ) -> Result<GeneratedQuery, AppError> {
        let system_prompt = build_system_prompt(context);
        let user_prompt = build_user_prompt(context, prompt);

        let raw = match settings.ai_provider {
            AiProvider::OpenAi => {
                self.call_openai(settings, &system_prompt, &user_prompt).await?
            }
            AiProvider::Claude => {
                self.call_claude(settings, &system_prompt, &user_prompt).await?
            }
        };

        Ok(parse_generated(&raw))
    }

    async fn call_openai(
        &self,
        settings: &AppSettings,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AppError> {
        let api_key = openai_key(settings)?;
        let base_url = settings
            .open_ai_base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
            .trim_end_matches('/');
        let model = settings.open_ai_model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);

        let body = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ]
        });

        debug!("Requesting completion from {} ({})", base_url, model);
        let response = self
            .client
            .post(format!("{}/chat/completions", base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::AiService(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::AiService(format!(
                "OpenAI returned {}: {}",
                status, detail
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::AiService(format!("invalid OpenAI response: {}", e)))?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::AiService("OpenAI response had no message content".to_string())
            })
    }

    async fn call_claude(
        &self,
        settings: &AppSettings,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AppError> {
        let api_key = claude_key(settings)?;
        let model = settings.claude_model.as_deref().unwrap_or(DEFAULT_CLAUDE_MODEL);

        let body = json!({
            "model": model,
            "max_tokens": CLAUDE_MAX_TOKENS,
            "system": system_prompt,
            "messages": [
                {"role": "user", "content": user_prompt}
            ]
        });

        debug!("Requesting completion from Claude ({})", model);
        let response = self
            .client
            .post(CLAUDE_MESSAGES_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::AiService(format!("Claude request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::AiService(format!(
                "Claude returned {}: {}",
                status, detail
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::AiService(format!("invalid Claude response: {}", e)))?;
        payload["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::AiService("Claude response had no text content".to_string()))
    }
}

/// Fails when the selected provider has no API key stored. Callers use this
/// to skip schema introspection when generation cannot proceed anyway.
pub fn ensure_configured(settings: &AppSettings) -> Result<(), AppError> {
    match settings.ai_provider {
        AiProvider::OpenAi => openai_key(settings).map(|_| ()),
        AiProvider::Claude => claude_key(settings).map(|_| ()),
    }
}

fn openai_key(settings: &AppSettings) -> Result<&str, AppError> {
    settings
        .open_ai_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| AppError::AiNotConfigured("no OpenAI API key in settings".to_string()))
}

fn claude_key(settings: &AppSettings) -> Result<&str, AppError> {
    settings
        .claude_api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| AppError::AiNotConfigured("no Claude API key in settings".to_string()))
}

fn build_system_prompt(context: &GenerationContext) -> String {
    let mut prompt = format!(
        r#"You are an expert {} analyst. Write a single read-only SQL query answering the user's request.
{}

Respond with only a JSON object, no prose and no code fences:
{{"query": "<the SQL>", "xColumn": "<column for the x axis>", "yColumns": ["<numeric columns to plot>"]}}
Omit xColumn and yColumns when the result does not suit a chart.

Schema:
{}"#,
        context.dialect.as_str(),
        dialect_hints(context.dialect),
        context.schema_ddl
    );
    if let Some(extension) = &context.prompt_extension {
        prompt.push_str("\n\nAdditional instructions for this connection:\n");
        prompt.push_str(extension);
    }
    prompt
}

fn build_user_prompt(context: &GenerationContext, prompt: &str) -> String {
    match &context.current_query {
        Some(current) if !current.trim().is_empty() => format!(
            "The query currently in the editor:\n{}\n\nRequest: {}",
            current, prompt
        ),
        _ => prompt.to_string(),
    }
}

fn dialect_hints(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => "Use double quotes for identifiers that need quoting and LIMIT for row caps.",
        Dialect::MySql => "Use backticks for identifiers that need quoting and LIMIT for row caps.",
    }
}

/// Strips code fences, then parses the strict JSON shape the system prompt
/// asks for. Replies in any other shape are treated as bare SQL.
fn parse_generated(raw: &str) -> GeneratedQuery {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```sql")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match serde_json::from_str::<GeneratedQuery>(cleaned) {
        Ok(generated) => generated,
        Err(_) => {
            warn!("Model reply was not the expected JSON shape; treating it as bare SQL");
            GeneratedQuery {
                query: cleaned.to_string(),
                x_column: None,
                y_columns: None,
            }
        }
    }
}
