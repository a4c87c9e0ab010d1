//! Paginated record retrieval.
//!
//! [`RecordFetcher::fetch_all`] walks a remote source page by page, `page_size`
//! records at a time, until a page comes back empty. A failed page stops the
//! walk; whatever was collected before it is kept and the failure is returned
//! alongside so the caller can warn about it. Pages are never retried.

use crate::domain::error::DashboardError;
use crate::domain::table::Table;
use crate::ports::page_port::{PageError, PagePort, PageRequest};
use std::thread;
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// What to fetch. Also the memoization key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    pub endpoint: String,
    pub page_size: usize,
    pub filter_key: String,
    pub filter_value: String,
}

impl FetchRequest {
    fn page(&self, offset: usize) -> PageRequest {
        PageRequest {
            endpoint: self.endpoint.clone(),
            limit: self.page_size,
            offset,
            filter_key: self.filter_key.clone(),
            filter_value: self.filter_value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub table: Table,
    /// Non-empty pages received.
    pub pages: usize,
    /// Set when a page failed and the table holds only earlier pages.
    pub failure: Option<PageError>,
}

impl FetchOutcome {
    pub fn is_partial(&self) -> bool {
        self.failure.is_some()
    }

    /// The failure as a user-facing warning.
    pub fn warning(&self) -> Option<DashboardError> {
        self.failure.as_ref().map(|e| DashboardError::FetchFailure {
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RecordFetcher {
    pause: Duration,
}

impl Default for RecordFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_PAUSE)
    }
}

impl RecordFetcher {
    pub fn new(pause: Duration) -> Self {
        Self { pause }
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    pub fn fetch_all(
        &self,
        source: &dyn PagePort,
        request: &FetchRequest,
    ) -> Result<FetchOutcome, DashboardError> {
        if request.page_size == 0 {
            return Err(DashboardError::ConfigInvalid {
                section: "api".into(),
                key: "page_size".into(),
                reason: "page_size must be positive".into(),
            });
        }

        let mut table = Table::default();
        let mut pages = 0;
        let mut offset = 0;

        let failure = loop {
            let page = request.page(offset);
            tracing::debug!(endpoint = %page.endpoint, offset, limit = page.limit, "requesting page");

            let records = match source.fetch_page(&page) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(offset, error = %e, "page failed; keeping {} records", table.len());
                    break Some(e);
                }
            };
            if records.is_empty() {
                break None;
            }

            table.extend(records);
            pages += 1;
            offset += request.page_size;

            if !self.pause.is_zero() {
                thread::sleep(self.pause);
            }
        };

        tracing::info!(records = table.len(), pages, partial = failure.is_some(), "fetch finished");
        Ok(FetchOutcome {
            table,
            pages,
            failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::Record;
    use std::cell::RefCell;

    struct ScriptedPages {
        pages: Vec<Result<Vec<Record>, PageError>>,
        seen_offsets: RefCell<Vec<usize>>,
    }

    impl PagePort for ScriptedPages {
        fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Record>, PageError> {
            let index = self.seen_offsets.borrow().len();
            self.seen_offsets.borrow_mut().push(request.offset);
            self.pages.get(index).cloned().unwrap_or(Ok(Vec::new()))
        }
    }

    fn page(n: usize, start: usize) -> Vec<Record> {
        (start..start + n)
            .map(|i| Record::new().with("id", i as f64))
            .collect()
    }

    fn request(page_size: usize) -> FetchRequest {
        FetchRequest {
            endpoint: "http://localhost/resource.json".into(),
            page_size,
            filter_key: "a_o_de_corte".into(),
            filter_value: "2023".into(),
        }
    }

    #[test]
    fn walks_offsets_until_empty_page() {
        let source = ScriptedPages {
            pages: vec![Ok(page(2, 0)), Ok(page(2, 2)), Ok(Vec::new())],
            seen_offsets: RefCell::new(Vec::new()),
        };
        let outcome = RecordFetcher::new(Duration::ZERO)
            .fetch_all(&source, &request(2))
            .unwrap();

        assert_eq!(*source.seen_offsets.borrow(), vec![0, 2, 4]);
        assert_eq!(outcome.table.len(), 4);
        assert_eq!(outcome.pages, 2);
        assert!(!outcome.is_partial());
        let ids: Vec<f64> = outcome
            .table
            .rows()
            .iter()
            .filter_map(|r| r.get("id").as_number())
            .collect();
        assert_eq!(ids, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn empty_first_page_gives_empty_table() {
        let source = ScriptedPages {
            pages: vec![Ok(Vec::new())],
            seen_offsets: RefCell::new(Vec::new()),
        };
        let outcome = RecordFetcher::new(Duration::ZERO)
            .fetch_all(&source, &request(10))
            .unwrap();
        assert!(outcome.table.is_empty());
        assert_eq!(outcome.pages, 0);
        assert!(outcome.warning().is_none());
    }

    #[test]
    fn transport_failure_keeps_earlier_pages() {
        let source = ScriptedPages {
            pages: vec![
                Ok(page(3, 0)),
                Err(PageError::Transport("connection reset".into())),
                Ok(page(3, 3)),
            ],
            seen_offsets: RefCell::new(Vec::new()),
        };
        let outcome = RecordFetcher::new(Duration::ZERO)
            .fetch_all(&source, &request(3))
            .unwrap();

        assert_eq!(outcome.table.len(), 3);
        assert_eq!(source.seen_offsets.borrow().len(), 2);
        assert!(matches!(
            outcome.warning(),
            Some(DashboardError::FetchFailure { reason }) if reason.contains("connection reset")
        ));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let source = ScriptedPages {
            pages: Vec::new(),
            seen_offsets: RefCell::new(Vec::new()),
        };
        let err = RecordFetcher::new(Duration::ZERO)
            .fetch_all(&source, &request(0))
            .unwrap_err();
        assert!(matches!(err, DashboardError::ConfigInvalid { key, .. } if key == "page_size"));
        assert!(source.seen_offsets.borrow().is_empty());
    }
}
