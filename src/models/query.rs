use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded query run. History and favorites share this shape; favoriting
/// an entry copies it verbatim, id included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryLogEntry {
    pub id: String,
    pub query: String,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphSpec>,
    pub timestamp: DateTime<Utc>,
}

/// Chart hints attached to an entry: which column feeds the x axis and which
/// columns are plotted against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphSpec {
    pub x_column: String,
    pub y_columns: Vec<String>,
}

impl QueryLogEntry {
    pub fn new(
        query: String,
        results: Vec<serde_json::Value>,
        graph: Option<GraphSpec>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            query,
            results,
            graph,
            timestamp: now,
        }
    }

    /// Merges a partial update into the entry. Absent patch fields leave the
    /// current values untouched.
    pub fn apply(&mut self, patch: EntryPatch) {
        if let Some(query) = patch.query {
            self.query = query;
        }
        if let Some(results) = patch.results {
            self.results = results;
        }
        if let Some(graph) = patch.graph {
            self.graph = Some(graph);
        }
        if let Some(timestamp) = patch.timestamp {
            self.timestamp = timestamp;
        }
    }
}

/// Partial update payload for a stored entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    pub query: Option<String>,
    pub results: Option<Vec<serde_json::Value>>,
    pub graph: Option<GraphSpec>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Result of one dispatched query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutput {
    pub rows: Vec<serde_json::Value>,
    pub row_count: usize,
    pub execution_time_ms: u64,
}

/// Parsed output of an AI generation call. Graph hints are absent when the
/// model answered with bare SQL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_columns: Option<Vec<String>>,
}
