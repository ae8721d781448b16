// PostgreSQL adapter. Each operation opens a fresh connection, drives it on
// a spawned task for the duration of the call, and tears it down on return.
use serde_json::{json, Value};
use std::time::Instant;
use tokio_postgres::NoTls;
use tracing::debug;

use crate::error::AppError;
use crate::models::{CatalogRow, QueryOutput};
use crate::services::database::adapter::DatabaseAdapter;
use crate::services::database::{mask_credentials, Dialect};

/// One catalog query covers every base table in `public`: columns joined
/// against key-constraint usage, so a column in several constraints fans out
/// into several rows. Domain types are cast to text/int4 so row extraction
/// stays uniform.
const CATALOG_QUERY: &str = r#"
SELECT
    c.table_name::text,
    c.column_name::text,
    c.data_type::text,
    c.is_nullable::text,
    c.column_default::text,
    c.character_maximum_length::int4,
    c.ordinal_position::int4,
    CASE WHEN tc.constraint_type = 'PRIMARY KEY' THEN true ELSE false END AS is_primary_key,
    CASE WHEN tc.constraint_type = 'UNIQUE' THEN true ELSE false END AS is_unique,
    ccu.table_name::text AS referenced_table,
    ccu.column_name::text AS referenced_column
FROM information_schema.columns c
JOIN information_schema.tables t
    ON t.table_schema = c.table_schema
    AND t.table_name = c.table_name
LEFT JOIN information_schema.key_column_usage kcu
    ON kcu.table_schema = c.table_schema
    AND kcu.table_name = c.table_name
    AND kcu.column_name = c.column_name
LEFT JOIN information_schema.table_constraints tc
    ON tc.constraint_name = kcu.constraint_name
    AND tc.table_schema = kcu.table_schema
LEFT JOIN information_schema.constraint_column_usage ccu
    ON ccu.constraint_name = tc.constraint_name
    AND tc.constraint_type = 'FOREIGN KEY'
WHERE c.table_schema = 'public'
  AND t.table_type = 'BASE TABLE'
ORDER BY c.table_name, c.ordinal_position
"#;

pub struct PostgresAdapter {
    connection_string: String,
}

impl PostgresAdapter {
    pub fn new(connection_string: &str) -> Self {
        Self {
            connection_string: connection_string.to_string(),
        }
    }

    /// Opens a connection and spawns its driver task. Dropping the client
    /// ends the task; callers await the handle to complete the disconnect.
    async fn connect(
        &self,
    ) -> Result<(tokio_postgres::Client, tokio::task::JoinHandle<()>), AppError> {
        debug!(
            "Connecting to {}",
            mask_credentials(&self.connection_string)
        );
        let (client, connection) = tokio_postgres::connect(&self.connection_string, NoTls)
            .await
            .map_err(|e| AppError::QueryExecutionFailed(format!("Connection failed: {}", e)))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!("Postgres connection closed with error: {}", e);
            }
        });

        Ok((client, driver))
    }
}

#[async_trait::async_trait]
impl DatabaseAdapter for PostgresAdapter {
    async fn execute_query(&self, sql: &str) -> Result<QueryOutput, AppError> {
        let (client, driver) = self.connect().await?;
        let start_time = Instant::now();

        let result = client.query(sql, &[]).await;
        drop(client);
        let _ = driver.await;

        let rows = result.map_err(|e| {
            let error_details = if let Some(db_error) = e.as_db_error() {
                format!(
                    "Code: {}, Message: {}",
                    db_error.code().code(),
                    db_error.message()
                )
            } else {
                format!("{}", e)
            };
            AppError::QueryExecutionFailed(error_details)
        })?;

        let json_rows = rows_to_json(&rows);
        let row_count = json_rows.len();
        let execution_time_ms = start_time.elapsed().as_millis() as u64;

        Ok(QueryOutput {
            rows: json_rows,
            row_count,
            execution_time_ms,
        })
    }

    async fn fetch_catalog(&self) -> Result<Vec<CatalogRow>, AppError> {
        let (client, driver) = self.connect().await?;

        let result = client.query(CATALOG_QUERY, &[]).await;
        drop(client);
        let _ = driver.await;

        let rows =
            result.map_err(|e| AppError::QueryExecutionFailed(format!("Catalog query failed: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| CatalogRow {
                table_name: row.get(0),
                column_name: row.get(1),
                data_type: row.get(2),
                is_nullable: row.get::<_, String>(3) == "YES",
                default_value: row.get::<_, Option<String>>(4),
                max_length: row.get::<_, Option<i32>>(5).map(i64::from),
                ordinal_position: row.get(6),
                is_primary_key: row.try_get(7).unwrap_or(false),
                is_unique: row.try_get(8).unwrap_or(false),
                referenced_table: row.get::<_, Option<String>>(9),
                referenced_column: row.get::<_, Option<String>>(10),
            })
            .collect())
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn test_connection(&self) -> Result<(), AppError> {
        let (client, driver) = self.connect().await?;
        drop(client);
        let _ = driver.await;
        Ok(())
    }
}

/// Converts driver rows to JSON objects keyed by column name. Numeric and
/// boolean types keep their JSON type, temporal types render as strings, and
/// everything else falls back to the driver's string conversion with a
/// `<type>` placeholder for values that have none.
fn rows_to_json(rows: &[tokio_postgres::Row]) -> Vec<Value> {
    let mut json_rows = Vec::with_capacity(rows.len());
    for row in rows {
        let mut row_obj = serde_json::Map::new();
        for (idx, column) in row.columns().iter().enumerate() {
            row_obj.insert(column.name().to_string(), cell_to_json(row, idx));
        }
        json_rows.push(Value::Object(row_obj));
    }
    json_rows
}

fn cell_to_json(row: &tokio_postgres::Row, idx: usize) -> Value {
    let column = &row.columns()[idx];
    match *column.type_() {
        tokio_postgres::types::Type::INT2 => opt_to_json(row.try_get::<_, Option<i16>>(idx)),
        tokio_postgres::types::Type::INT4 => opt_to_json(row.try_get::<_, Option<i32>>(idx)),
        tokio_postgres::types::Type::INT8 => opt_to_json(row.try_get::<_, Option<i64>>(idx)),
        tokio_postgres::types::Type::FLOAT4 => opt_to_json(row.try_get::<_, Option<f32>>(idx)),
        tokio_postgres::types::Type::FLOAT8 => opt_to_json(row.try_get::<_, Option<f64>>(idx)),
        tokio_postgres::types::Type::BOOL => opt_to_json(row.try_get::<_, Option<bool>>(idx)),
        tokio_postgres::types::Type::TIMESTAMP => {
            match row.try_get::<_, Option<chrono::NaiveDateTime>>(idx) {
                Ok(Some(v)) => json!(v.to_string()),
                Ok(None) => Value::Null,
                Err(_) => json!(format!("<{}>", column.type_().name())),
            }
        }
        tokio_postgres::types::Type::TIMESTAMPTZ => {
            match row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx) {
                Ok(Some(v)) => json!(v.to_rfc3339()),
                Ok(None) => Value::Null,
                Err(_) => json!(format!("<{}>", column.type_().name())),
            }
        }
        tokio_postgres::types::Type::DATE => {
            match row.try_get::<_, Option<chrono::NaiveDate>>(idx) {
                Ok(Some(v)) => json!(v.to_string()),
                Ok(None) => Value::Null,
                Err(_) => json!(format!("<{}>", column.type_().name())),
            }
        }
        _ => match row.try_get::<_, Option<String>>(idx) {
            Ok(Some(v)) => json!(v),
            Ok(None) => Value::Null,
            Err(_) => json!(format!("<{}>", column.type_().name())),
        },
    }
}

fn opt_to_json<T: serde::Serialize>(value: Result<Option<T>, tokio_postgres::Error>) -> Value {
    match value {
        Ok(Some(v)) => json!(v),
        _ => Value::Null,
    }
}
