//! Tabular records shared by every pipeline stage.
//!
//! A [`Table`] is an ordered list of [`Record`]s plus the column names seen so
//! far, in first-seen order. Cells are [`Value`]s: raw text, a parsed number, or
//! the explicit missing marker.

use crate::domain::error::DashboardError;
use std::collections::{HashMap, HashSet};
use std::fmt;

static MISSING: Value = Value::Missing;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// The numeric value, if this cell has already been normalized.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text used for comparisons and selector options; `None` for missing cells.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            // 4111.0 reads back as the code "4111"
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{n:.0}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Missing => Ok(()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Missing,
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Missing),
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

/// One row: column name -> cell. Absent columns read as [`Value::Missing`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value.into());
        self
    }

    pub fn get(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&MISSING)
    }

    pub fn set(&mut self, column: &str, value: Value) {
        self.fields.insert(column.to_string(), value);
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn from_json(object: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            fields: object.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn require_column(&self, column: &str) -> Result<(), DashboardError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(DashboardError::UnknownColumn {
                column: column.to_string(),
            })
        }
    }

    /// Append a row, registering any column not seen before. Keys of a record
    /// have no inherent order, so new columns from one record are sorted.
    pub fn push(&mut self, record: Record) {
        let mut new_columns: Vec<&str> = record
            .column_names()
            .filter(|name| !self.has_column(name))
            .collect();
        new_columns.sort_unstable();
        let new_columns: Vec<String> = new_columns.into_iter().map(String::from).collect();
        self.columns.extend(new_columns);
        self.rows.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            self.push(record);
        }
    }

    /// Same schema, only the rows matching `keep`.
    pub fn filter_rows(&self, mut keep: impl FnMut(&Record) -> bool) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(*r)).cloned().collect(),
        }
    }

    /// Same rows, every cell of `column` replaced by `f(cell)`.
    pub fn map_column(&self, column: &str, mut f: impl FnMut(&Value) -> Value) -> Table {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                let mapped = f(row.get(column));
                row.set(column, mapped);
                row
            })
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Keep only `columns`, in the given order.
    pub fn project(&self, columns: &[&str]) -> Result<Table, DashboardError> {
        for column in columns {
            self.require_column(column)?;
        }
        let rows = self
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .fold(Record::new(), |acc, c| acc.with(c, row.get(c).clone()))
            })
            .collect();
        Ok(Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// Distinct non-missing values of `column`, in first-seen order.
    pub fn distinct_values(&self, column: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|row| row.get(column).as_key())
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let mut table = Table::new(vec!["name".into(), "ciiu".into()]);
        table.push(Record::new().with("name", "Marval").with("ciiu", "4111"));
        table.push(Record::new().with("name", "Amarilo").with("ciiu", 4111.0));
        table.push(Record::new().with("name", "Conconcreto").with("ciiu", "4290"));
        table.push(Record::new().with("name", "Marval"));
        table
    }

    #[test]
    fn missing_column_reads_as_missing() {
        let table = sample_table();
        assert!(table.rows()[3].get("ciiu").is_missing());
        assert!(table.rows()[0].get("nope").is_missing());
    }

    #[test]
    fn distinct_values_keep_first_seen_order_and_skip_missing() {
        let table = sample_table();
        assert_eq!(table.distinct_values("ciiu"), vec!["4111", "4290"]);
        assert_eq!(
            table.distinct_values("name"),
            vec!["Marval", "Amarilo", "Conconcreto"]
        );
    }

    #[test]
    fn push_registers_new_columns_in_order() {
        let mut table = Table::default();
        table.push(Record::new().with("b", "1").with("a", "2"));
        table.push(Record::new().with("c", "3").with("a", "4"));
        assert_eq!(table.columns(), &["a", "b", "c"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn project_keeps_named_columns_only() {
        let table = sample_table();
        let projected = table.project(&["ciiu"]).unwrap();
        assert_eq!(projected.columns(), &["ciiu"]);
        assert!(projected.rows()[0].get("name").is_missing());
        assert_eq!(projected.len(), 4);
    }

    #[test]
    fn project_rejects_unknown_column() {
        let table = sample_table();
        let err = table.project(&["total_activos"]).unwrap_err();
        assert!(matches!(err, DashboardError::UnknownColumn { column } if column == "total_activos"));
    }

    #[test]
    fn json_values_map_to_cells() {
        let json: serde_json::Value = serde_json::json!({
            "name": "Marval S.A.S.",
            "ciiu": 4111,
            "nota": null,
            "activo": true
        });
        let serde_json::Value::Object(map) = json else {
            panic!("expected object");
        };
        let record = Record::from_json(map);
        assert_eq!(record.get("name"), &Value::Text("Marval S.A.S.".into()));
        assert_eq!(record.get("ciiu"), &Value::Number(4111.0));
        assert!(record.get("nota").is_missing());
        assert_eq!(record.get("activo"), &Value::Text("true".into()));
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(Value::Number(4111.0).to_string(), "4111");
        assert_eq!(Value::Number(12.5).to_string(), "12.5");
        assert_eq!(Value::Missing.as_key(), None);
    }
}
