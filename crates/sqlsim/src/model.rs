//! Core domain types shared by the store, the loader and the UI.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Short random identifier for tabs and saved queries.
pub fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..7].to_string()
}

/// A named query buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlTab {
    pub id: String,
    pub title: String,
    pub query: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SqlTab {
    pub fn new(title: impl Into<String>, query: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: short_id(),
            title: title.into(),
            query: query.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A query kept by the user from the sidebar's "Saved" section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    pub id: String,
    pub title: String,
    pub sql: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub id: String,
    pub header: String,
    pub accessor_key: String,
}

impl TableColumn {
    /// Column whose header is derived from the key (`order_id` -> `ORDER ID`).
    pub fn from_key(key: &str) -> Self {
        Self {
            id: key.to_string(),
            header: header_for_key(key),
            accessor_key: key.to_string(),
        }
    }
}

pub fn header_for_key(key: &str) -> String {
    key.replace('_', " ").to_uppercase()
}

pub fn make_columns(keys: &[&str]) -> Vec<TableColumn> {
    keys.iter().map(|k| TableColumn::from_key(k)).collect()
}

/// A dynamically typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Ordering used by the grid. Nulls are handled by the caller.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (a, b) if a.is_number() && b.is_number() => {
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            // Numbers before booleans before text.
            (a, b) => {
                let rank = |v: &Value| match v {
                    Value::Int(_) | Value::Float(_) => 0,
                    Value::Bool(_) => 1,
                    _ => 2,
                };
                match rank(a).cmp(&rank(b)) {
                    Ordering::Equal => a
                        .to_string()
                        .to_lowercase()
                        .cmp(&b.to_string().to_lowercase()),
                    other => other,
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => {
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{}", *x as i64)
                } else {
                    write!(f, "{}", x)
                }
            }
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// A result row keyed by column accessor.
pub type Row = HashMap<String, Value>;

/// Tabular payload rendered by the grid and chart views.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub execution_ms: u64,
}

impl QueryResult {
    pub fn new(columns: Vec<TableColumn>, rows: Vec<Row>, execution_ms: u64) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
            execution_ms,
        }
    }

    /// Single `placeholder` column with no rows.
    pub fn placeholder() -> Self {
        Self::new(
            vec![TableColumn {
                id: "placeholder".to_string(),
                header: "PLACEHOLDER".to_string(),
                accessor_key: "placeholder".to_string(),
            }],
            Vec::new(),
            0,
        )
    }

    pub fn cell(&self, row: usize, column: &TableColumn) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(&column.accessor_key))
    }
}

/// Where a predefined query's rows come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySource {
    /// A CSV file under the configured base URL.
    RemoteCsv {
        file: &'static str,
        limit: Option<usize>,
    },
    /// A dataset generated in memory.
    Local(LocalDataset),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalDataset {
    Users,
    Sales,
    Teams,
}

/// A canned stand-in for real query execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PredefinedQuery {
    pub id: &'static str,
    pub title: &'static str,
    pub description: Option<&'static str>,
    pub sql: &'static str,
    pub source: QuerySource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_replaces_underscores_and_uppercases() {
        assert_eq!(header_for_key("order_id"), "ORDER ID");
        assert_eq!(header_for_key("price_usd"), "PRICE USD");
        assert_eq!(header_for_key("CustomerID"), "CUSTOMERID");
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Float(12.0).to_string(), "12");
        assert_eq!(Value::Float(10.75).to_string(), "10.75");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int(-3).to_string(), "-3");
    }

    #[test]
    fn value_compare_mixes_ints_and_floats() {
        assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Ordering::Less);
        assert_eq!(Value::Float(3.0).compare(&Value::Int(3)), Ordering::Equal);
    }

    #[test]
    fn value_compare_text_is_case_insensitive() {
        assert_eq!(
            Value::from("apple").compare(&Value::from("Banana")),
            Ordering::Less
        );
    }

    #[test]
    fn short_ids_are_seven_chars() {
        let id = short_id();
        assert_eq!(id.len(), 7);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(short_id(), short_id());
    }

    #[test]
    fn tab_serializes_camel_case() {
        let tab = SqlTab {
            id: "abc1234".to_string(),
            title: "Query 1".to_string(),
            query: "SELECT 1;".to_string(),
            created_at: 1,
            updated_at: 2,
        };
        let json = serde_json::to_string(&tab).unwrap();
        assert!(json.contains("\"createdAt\":1"));
        assert!(json.contains("\"updatedAt\":2"));
    }
}
