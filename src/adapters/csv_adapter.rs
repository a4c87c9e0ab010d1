//! CSV spreadsheet adapter for file mode.

use crate::domain::error::DashboardError;
use crate::domain::table::{Record, Table, Value};
use crate::ports::table_port::TablePort;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvAdapter;

impl CsvAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(content: &str) -> Result<Table, DashboardError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| DashboardError::CsvParse {
                reason: e.to_string(),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut table = Table::new(headers.clone());
        for result in rdr.records() {
            let row = result.map_err(|e| DashboardError::CsvParse {
                reason: e.to_string(),
            })?;
            let mut record = Record::new();
            for (column, cell) in headers.iter().zip(row.iter()) {
                let cell = cell.trim();
                let value = if cell.is_empty() {
                    Value::Missing
                } else {
                    Value::Text(cell.to_string())
                };
                record.set(column, value);
            }
            table.push(record);
        }
        Ok(table)
    }
}

impl TablePort for CsvAdapter {
    fn load_table(&self, path: &Path) -> Result<Table, DashboardError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DashboardError::InputMissing {
                reason: format!("{} does not exist", path.display()),
            },
            _ => DashboardError::Io(e),
        })?;
        Self::parse(&content)
    }
}

/// Write `table` as CSV, columns in table order, missing cells empty.
pub fn write_table<W: Write>(table: &Table, writer: W) -> Result<(), DashboardError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let to_err = |e: csv::Error| DashboardError::CsvParse {
        reason: e.to_string(),
    };
    wtr.write_record(table.columns()).map_err(to_err)?;
    for row in table.rows() {
        wtr.write_record(table.columns().iter().map(|c| row.get(c).to_string()))
            .map_err(to_err)?;
    }
    wtr.flush()?;
    Ok(())
}
