//! Remote page access port trait.

use crate::domain::table::Record;

/// Parameters of one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub endpoint: String,
    pub limit: usize,
    pub offset: usize,
    pub filter_key: String,
    pub filter_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("connection error: {0}")]
    Transport(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

pub trait PagePort {
    /// Fetch one page. An empty `Vec` means there are no more records.
    fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Record>, PageError>;
}
