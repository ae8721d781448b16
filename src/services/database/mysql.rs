// MySQL adapter. Each operation opens a fresh connection and disconnects it
// before returning; no pool sits between calls.
use mysql_async::{prelude::*, Conn, Opts, Row, Value as MySqlValue};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

use crate::error::AppError;
use crate::models::{CatalogRow, QueryOutput};
use crate::services::database::adapter::DatabaseAdapter;
use crate::services::database::{mask_credentials, Dialect};

/// One catalog query for every base table in the connection's own database.
/// `COLUMN_KEY` carries the per-column key flags directly; the join against
/// `KEY_COLUMN_USAGE` only adds foreign-key references, fanning out a row per
/// referencing constraint.
const CATALOG_QUERY: &str = r#"
SELECT
    c.TABLE_NAME,
    c.COLUMN_NAME,
    c.DATA_TYPE,
    c.IS_NULLABLE,
    c.COLUMN_DEFAULT,
    c.CHARACTER_MAXIMUM_LENGTH,
    c.ORDINAL_POSITION,
    CASE WHEN c.COLUMN_KEY = 'PRI' THEN 1 ELSE 0 END AS is_primary_key,
    CASE WHEN c.COLUMN_KEY = 'UNI' THEN 1 ELSE 0 END AS is_unique,
    k.REFERENCED_TABLE_NAME,
    k.REFERENCED_COLUMN_NAME
FROM information_schema.COLUMNS c
JOIN information_schema.TABLES t
    ON t.TABLE_SCHEMA = c.TABLE_SCHEMA
    AND t.TABLE_NAME = c.TABLE_NAME
LEFT JOIN information_schema.KEY_COLUMN_USAGE k
    ON k.TABLE_SCHEMA = c.TABLE_SCHEMA
    AND k.TABLE_NAME = c.TABLE_NAME
    AND k.COLUMN_NAME = c.COLUMN_NAME
    AND k.REFERENCED_TABLE_NAME IS NOT NULL
WHERE c.TABLE_SCHEMA = DATABASE()
  AND t.TABLE_TYPE = 'BASE TABLE'
ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION
"#;

type RawCatalogRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<u64>,
    u32,
    u8,
    u8,
    Option<String>,
    Option<String>,
);

pub struct MySqlAdapter {
    connection_string: String,
}

impl MySqlAdapter {
    pub fn new(connection_string: &str) -> Self {
        Self {
            connection_string: connection_string.to_string(),
        }
    }

    /// Fresh connection for one call.
    async fn connect(&self) -> Result<Conn, AppError> {
        debug!(
            "Connecting to {}",
            mask_credentials(&self.connection_string)
        );
        let opts = Opts::from_url(&self.connection_string)
            .map_err(|e| AppError::QueryExecutionFailed(format!("Invalid MySQL URL: {}", e)))?;
        Conn::new(opts)
            .await
            .map_err(|e| AppError::QueryExecutionFailed(format!("Connection failed: {}", e)))
    }

    /// Converts a MySQL wire value to JSON. Text and blob payloads arrive as
    /// bytes; non-UTF-8 payloads degrade to null.
    fn mysql_value_to_json(mysql_val: MySqlValue) -> Value {
        match mysql_val {
            MySqlValue::NULL => Value::Null,
            MySqlValue::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(s) => json!(s),
                Err(_) => Value::Null,
            },
            MySqlValue::Int(i) => json!(i),
            MySqlValue::UInt(u) => json!(u),
            MySqlValue::Float(f) => json!(f),
            MySqlValue::Double(d) => json!(d),
            MySqlValue::Date(y, m, d, h, min, s, _) => {
                json!(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    y, m, d, h, min, s
                ))
            }
            MySqlValue::Time(is_neg, d, h, m, s, _) => {
                let sign = if is_neg { "-" } else { "" };
                let total_hours = d * 24 + h as u32;
                json!(format!("{}{}:{:02}:{:02}", sign, total_hours, m, s))
            }
        }
    }
}

#[async_trait::async_trait]
impl DatabaseAdapter for MySqlAdapter {
    async fn execute_query(&self, sql: &str) -> Result<QueryOutput, AppError> {
        let mut conn = self.connect().await?;
        let start_time = Instant::now();

        let result: Result<Vec<Row>, _> = conn.query(sql).await;
        let _ = conn.disconnect().await;

        let rows = result
            .map_err(|e| AppError::QueryExecutionFailed(format!("{}", e)))?;

        let mut json_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let mut row_obj = serde_json::Map::new();
            let columns = row.columns_ref();
            for (idx, column) in columns.iter().enumerate() {
                let value: Value = match row.get_opt::<MySqlValue, usize>(idx) {
                    Some(Ok(mysql_val)) => Self::mysql_value_to_json(mysql_val),
                    _ => Value::Null,
                };
                row_obj.insert(column.name_str().to_string(), value);
            }
            json_rows.push(Value::Object(row_obj));
        }

        let row_count = json_rows.len();
        let execution_time_ms = start_time.elapsed().as_millis() as u64;

        Ok(QueryOutput {
            rows: json_rows,
            row_count,
            execution_time_ms,
        })
    }

    async fn fetch_catalog(&self) -> Result<Vec<CatalogRow>, AppError> {
        let mut conn = self.connect().await?;

        let result: Result<Vec<RawCatalogRow>, _> = conn.query(CATALOG_QUERY).await;
        let _ = conn.disconnect().await;

        let rows = result
            .map_err(|e| AppError::QueryExecutionFailed(format!("Catalog query failed: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    table_name,
                    column_name,
                    data_type,
                    is_nullable,
                    default_value,
                    max_length,
                    ordinal_position,
                    is_pk,
                    is_unique,
                    referenced_table,
                    referenced_column,
                )| CatalogRow {
                    table_name,
                    column_name,
                    data_type,
                    is_nullable: is_nullable == "YES",
                    is_primary_key: is_pk == 1,
                    is_unique: is_unique == 1,
                    default_value,
                    max_length: max_length.map(|v| v as i64),
                    ordinal_position: ordinal_position as i32,
                    referenced_table,
                    referenced_column,
                },
            )
            .collect())
    }

    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn test_connection(&self) -> Result<(), AppError> {
        let conn = self.connect().await?;
        let _ = conn.disconnect().await;
        Ok(())
    }
}
