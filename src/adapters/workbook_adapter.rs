//! Excel/ODS workbook adapter for file mode, plus the extension dispatcher
//! that picks between it and the CSV reader.

use crate::adapters::csv_adapter::CsvAdapter;
use crate::domain::error::DashboardError;
use crate::domain::table::{Record, Table, Value};
use crate::ports::table_port::TablePort;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Reads the first worksheet; the first row holds the column names.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookAdapter;

impl WorkbookAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn workbook_error(path: &Path, e: impl std::fmt::Display) -> DashboardError {
    DashboardError::WorkbookParse {
        reason: format!("{}: {e}", path.display()),
    }
}

fn header_name(cell: &Data, index: usize) -> String {
    let name = match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    };
    if name.is_empty() {
        format!("column_{}", index + 1)
    } else {
        name
    }
}

/// Numeric cells stay numbers; text is trimmed and kept raw for the normalizer.
pub fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) if f.is_finite() => Value::Number(*f),
        Data::String(s) if s.trim().is_empty() => Value::Missing,
        Data::String(s) => Value::Text(s.trim().to_string()),
        Data::Empty | Data::Error(_) | Data::Float(_) => Value::Missing,
        other => Value::Text(other.to_string()),
    }
}

impl TablePort for WorkbookAdapter {
    fn load_table(&self, path: &Path) -> Result<Table, DashboardError> {
        if !path.exists() {
            return Err(DashboardError::InputMissing {
                reason: format!("{} does not exist", path.display()),
            });
        }
        let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(path, e))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| workbook_error(path, "workbook has no worksheets"))?
            .map_err(|e| workbook_error(path, e))?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(Table::default());
        };
        let columns: Vec<String> = header
            .iter()
            .enumerate()
            .map(|(i, cell)| header_name(cell, i))
            .collect();

        let mut table = Table::new(columns.clone());
        for row in rows {
            if row.iter().all(|cell| matches!(cell, Data::Empty)) {
                continue;
            }
            let mut record = Record::new();
            for (column, cell) in columns.iter().zip(row.iter()) {
                record.set(column, cell_value(cell));
            }
            table.push(record);
        }
        tracing::debug!(path = %path.display(), rows = table.len(), "workbook loaded");
        Ok(table)
    }
}

/// File-mode loader: workbook extensions go to calamine, everything else is
/// read as CSV.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetAdapter {
    csv: CsvAdapter,
    workbook: WorkbookAdapter,
}

impl SpreadsheetAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_workbook(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                WORKBOOK_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
    }
}

impl TablePort for SpreadsheetAdapter {
    fn load_table(&self, path: &Path) -> Result<Table, DashboardError> {
        if Self::is_workbook(path) {
            self.workbook.load_table(path)
        } else {
            self.csv.load_table(path)
        }
    }
}
