// Database adapter trait, one implementation per dialect.
use crate::error::AppError;
use crate::models::{CatalogRow, QueryOutput};
use crate::services::database::Dialect;

/// Abstraction over the two wire clients. Every call is a complete
/// connect/execute/disconnect cycle; adapters hold no live connection state
/// between calls, and failures carry the driver's own message.
#[async_trait::async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Execute a SQL statement verbatim and return its rows as JSON objects.
    async fn execute_query(&self, sql: &str) -> Result<QueryOutput, AppError>;

    /// Fetch raw catalog rows for base tables in the default schema, ordered
    /// by table name then ordinal position. Constraint joins may emit the
    /// same column several times; callers fold the duplicates.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRow>, AppError>;

    /// The dialect this adapter speaks.
    fn dialect(&self) -> Dialect;

    /// Connect/disconnect with no statement executed; success means the
    /// credentials and network path are valid.
    async fn test_connection(&self) -> Result<(), AppError>;
}
