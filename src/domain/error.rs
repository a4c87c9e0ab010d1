//! Domain error types.

/// Top-level error type for balance-dashboard.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("no input data: {reason}")]
    InputMissing { reason: String },

    #[error("no entities selected")]
    SelectionEmpty,

    #[error("no rows found for category {value}")]
    FilterEmpty { value: String },

    #[error("fetch failed: {reason}")]
    FetchFailure { reason: String },

    #[error("unknown column: {column}")]
    UnknownColumn { column: String },

    #[error("CSV parse error: {reason}")]
    CsvParse { reason: String },

    #[error("workbook read error: {reason}")]
    WorkbookParse { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    /// Pipeline outcomes the user can fix by changing a choice; reported as warnings.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            DashboardError::InputMissing { .. }
                | DashboardError::SelectionEmpty
                | DashboardError::FilterEmpty { .. }
                | DashboardError::FetchFailure { .. }
        )
    }
}

impl From<&DashboardError> for std::process::ExitCode {
    fn from(err: &DashboardError) -> Self {
        let code: u8 = match err {
            DashboardError::Io(_) => 1,
            DashboardError::ConfigParse { .. } | DashboardError::ConfigInvalid { .. } => 2,
            DashboardError::FetchFailure { .. } => 3,
            DashboardError::InputMissing { .. }
            | DashboardError::UnknownColumn { .. }
            | DashboardError::CsvParse { .. }
            | DashboardError::WorkbookParse { .. } => 4,
            DashboardError::SelectionEmpty | DashboardError::FilterEmpty { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
