use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Connection already exists: {0}")]
    AlreadyExists(String),

    #[error("Connection not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported connection string: {0}")]
    UnsupportedConnection(String),

    #[error("Query execution failed: {0}")]
    QueryExecutionFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("AI provider not configured: {0}")]
    AiNotConfigured(String),

    #[error("AI service error: {0}")]
    AiService(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}
