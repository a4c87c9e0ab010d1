//! Local spreadsheet access port trait.

use crate::domain::error::DashboardError;
use crate::domain::table::Table;
use std::path::Path;

pub trait TablePort {
    /// Load every row of the spreadsheet at `path`. Amounts may arrive as text
    /// or numbers; normalization happens later.
    fn load_table(&self, path: &Path) -> Result<Table, DashboardError>;
}
