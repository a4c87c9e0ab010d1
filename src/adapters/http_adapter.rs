//! HTTP page adapter for Socrata-style JSON resources.
//!
//! Each page is a blocking `GET <endpoint>?$limit=N&$offset=M&<filter_key>=<value>`
//! answered with a JSON array of objects.

use crate::domain::error::DashboardError;
use crate::domain::table::Record;
use crate::ports::page_port::{PageError, PagePort, PageRequest};
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://www.datos.gov.co/resource/6cat-2gcs.json";
pub const DEFAULT_FILTER_KEY: &str = "a_o_de_corte";
pub const DEFAULT_FILTER_VALUE: &str = "2023";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct PageQuery {
    #[serde(rename = "$limit")]
    limit: usize,
    #[serde(rename = "$offset")]
    offset: usize,
}

pub struct HttpAdapter {
    client: Client,
}

impl HttpAdapter {
    pub fn new(timeout: Duration) -> Result<Self, DashboardError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::FetchFailure {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

pub fn parse_page(body: &str) -> Result<Vec<Record>, PageError> {
    let objects: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(body).map_err(|e| PageError::Decode(e.to_string()))?;
    Ok(objects.into_iter().map(Record::from_json).collect())
}

impl PagePort for HttpAdapter {
    fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Record>, PageError> {
        let response = self
            .client
            .get(&request.endpoint)
            .query(&PageQuery {
                limit: request.limit,
                offset: request.offset,
            })
            .query(&[(request.filter_key.as_str(), request.filter_value.as_str())])
            .send()
            .map_err(|e| PageError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| PageError::Transport(e.to_string()))?;
        let records = parse_page(&body)?;
        tracing::debug!(offset = request.offset, records = records.len(), "page received");
        Ok(records)
    }
}

/// Page source for runs that only read local spreadsheets; no client is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNetwork;

impl PagePort for NoNetwork {
    fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Record>, PageError> {
        Err(PageError::Transport(format!(
            "{} not fetched: this run reads local files only",
            request.endpoint
        )))
    }
}
