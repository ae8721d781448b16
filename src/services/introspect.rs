// Schema introspection: raw catalog rows folded into a structured model,
// plus a pseudo-DDL rendering used as LLM context.
use tracing::debug;

use crate::error::AppError;
use crate::models::{CatalogRow, ColumnInfo, TableSchema};
use crate::services::database::create_adapter;
use crate::store::ConnectionStore;

/// Builds the table/column model fresh from the live catalog on every call;
/// nothing is cached between calls.
pub struct SchemaService {
    connections: ConnectionStore,
}

impl SchemaService {
    pub fn new(connections: ConnectionStore) -> Self {
        Self { connections }
    }

    /// Introspects the named connection's default schema.
    pub async fn describe(&self, connection_name: &str) -> Result<Vec<TableSchema>, AppError> {
        let connection_string = self.connections.connection_string(connection_name).await?;
        let adapter = create_adapter(&connection_string)?;
        let rows = adapter.fetch_catalog().await?;
        debug!(
            "Introspected {} catalog rows for {}",
            rows.len(),
            connection_name
        );
        Ok(fold_catalog_rows(rows))
    }

    /// Renders the catalog as one pseudo-DDL block per table. The output is
    /// prompt context for query generation, not executable SQL.
    pub async fn render_ddl(&self, connection_string: &str) -> Result<String, AppError> {
        let adapter = create_adapter(connection_string)?;
        let rows = adapter.fetch_catalog().await?;
        Ok(render_create_table_text(&rows))
    }
}

/// Deterministic fold keyed by (table, column). The first occurrence supplies
/// the base fields; duplicate rows from constraint fan-out only ever raise
/// the key flags, so input order cannot affect the result. Output is ordered
/// by table name, then ordinal position.
fn fold_catalog_rows(mut rows: Vec<CatalogRow>) -> Vec<TableSchema> {
    rows.sort_by(|a, b| {
        a.table_name
            .cmp(&b.table_name)
            .then(a.ordinal_position.cmp(&b.ordinal_position))
    });

    let mut tables: Vec<TableSchema> = Vec::new();
    for row in rows {
        match tables.last_mut() {
            Some(table) if table.table_name == row.table_name => {
                match table
                    .columns
                    .iter_mut()
                    .find(|column| column.column_name == row.column_name)
                {
                    Some(column) => {
                        column.is_primary_key |= row.is_primary_key;
                        column.is_unique |= row.is_unique;
                    }
                    None => table.columns.push(column_from(row)),
                }
            }
            _ => {
                let table_name = row.table_name.clone();
                tables.push(TableSchema {
                    table_name,
                    columns: vec![column_from(row)],
                });
            }
        }
    }
    tables
}

fn column_from(row: CatalogRow) -> ColumnInfo {
    ColumnInfo {
        column_name: row.column_name,
        data_type: row.data_type,
        is_nullable: row.is_nullable,
        is_primary_key: row.is_primary_key,
        is_unique: row.is_unique,
        default_value: row.default_value,
        max_length: row.max_length,
    }
}

/// One `CREATE TABLE` block per table, column lines deduplicated by exact
/// text equality. Lines that differ only in their foreign-key reference or
/// default rendering are kept as-is.
fn render_create_table_text(rows: &[CatalogRow]) -> String {
    let mut sorted: Vec<&CatalogRow> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        a.table_name
            .cmp(&b.table_name)
            .then(a.ordinal_position.cmp(&b.ordinal_position))
    });

    let mut blocks: Vec<String> = Vec::new();
    let mut current_table: Option<&str> = None;
    let mut lines: Vec<String> = Vec::new();

    for row in sorted {
        if current_table != Some(row.table_name.as_str()) {
            if let Some(table) = current_table {
                blocks.push(format_block(table, &lines));
            }
            current_table = Some(row.table_name.as_str());
            lines.clear();
        }
        let line = render_column_line(row);
        if !lines.contains(&line) {
            lines.push(line);
        }
    }
    if let Some(table) = current_table {
        blocks.push(format_block(table, &lines));
    }

    blocks.join("\n\n")
}

fn format_block(table: &str, lines: &[String]) -> String {
    format!("CREATE TABLE {} (\n{}\n);", table, lines.join(",\n"))
}

fn render_column_line(row: &CatalogRow) -> String {
    let mut line = format!("  {} {}", row.column_name, row.data_type);
    if let Some(len) = row.max_length {
        line.push_str(&format!("({})", len));
    }
    if !row.is_nullable {
        line.push_str(" NOT NULL");
    }
    if row.is_primary_key {
        line.push_str(" PRIMARY KEY");
    }
    if row.is_unique {
        line.push_str(" UNIQUE");
    }
    if let (Some(table), Some(column)) = (&row.referenced_table, &row.referenced_column) {
        line.push_str(&format!(" REFERENCES {}({})", table, column));
    }
    if let Some(default) = &row.default_value {
        line.push_str(&format!(" DEFAULT {}", default));
    }
    line
}
