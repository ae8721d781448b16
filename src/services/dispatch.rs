// Query dispatch: a logical connection name resolved to one live round trip.
use tracing::info;

use crate::error::AppError;
use crate::models::QueryOutput;
use crate::services::database::{create_adapter, mask_credentials};
use crate::store::ConnectionStore;

/// Executes SQL over a fresh connection per call. The dispatcher neither
/// parses nor restricts statements; whatever the driver accepts runs.
pub struct QueryDispatcher {
    connections: ConnectionStore,
}

impl QueryDispatcher {
    pub fn new(connections: ConnectionStore) -> Self {
        Self { connections }
    }

    /// Resolve the name, connect, execute, disconnect.
    pub async fn run(&self, connection_name: &str, sql: &str) -> Result<QueryOutput, AppError> {
        let connection_string = self.connections.connection_string(connection_name).await?;
        let adapter = create_adapter(&connection_string)?;
        info!(
            "Executing query on {} ({})",
            connection_name,
            adapter.dialect().as_str()
        );
        let output = adapter.execute_query(sql).await?;
        info!(
            "Query on {} returned {} rows in {}ms",
            connection_name, output.row_count, output.execution_time_ms
        );
        Ok(output)
    }

    /// Connects and disconnects without executing a statement.
    pub async fn test_connection(&self, connection_string: &str) -> Result<(), AppError> {
        let adapter = create_adapter(connection_string)?;
        info!(
            "Testing connection to {}",
            mask_credentials(connection_string)
        );
        adapter.test_connection().await
    }
}
