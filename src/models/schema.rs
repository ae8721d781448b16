use serde::{Deserialize, Serialize};

/// One table's introspected shape, columns in ordinal order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
}

/// Raw catalog row as returned by the dialect's introspection query. The
/// constraint joins fan out one row per (column, constraint), so the same
/// column can appear several times with different flag combinations; the
/// introspection fold collapses them.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub default_value: Option<String>,
    pub max_length: Option<i64>,
    pub ordinal_position: i32,
    pub referenced_table: Option<String>,
    pub referenced_column: Option<String>,
}
