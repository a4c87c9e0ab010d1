#![allow(dead_code)]

use balance_dashboard::domain::table::Record;
use balance_dashboard::ports::page_port::{PageError, PagePort, PageRequest};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Serves scripted pages by offset; unscripted offsets return an empty page.
pub struct MockPagePort {
    pub pages: HashMap<usize, Vec<Record>>,
    pub failures: HashMap<usize, PageError>,
    pub calls: Cell<usize>,
    pub requests: RefCell<Vec<PageRequest>>,
}

impl MockPagePort {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            failures: HashMap::new(),
            calls: Cell::new(0),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_page(mut self, offset: usize, records: Vec<Record>) -> Self {
        self.pages.insert(offset, records);
        self
    }

    pub fn with_failure(mut self, offset: usize, error: PageError) -> Self {
        self.failures.insert(offset, error);
        self
    }

    pub fn offsets(&self) -> Vec<usize> {
        self.requests.borrow().iter().map(|r| r.offset).collect()
    }
}

impl PagePort for MockPagePort {
    fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Record>, PageError> {
        self.calls.set(self.calls.get() + 1);
        self.requests.borrow_mut().push(request.clone());
        if let Some(error) = self.failures.get(&request.offset) {
            return Err(error.clone());
        }
        Ok(self.pages.get(&request.offset).cloned().unwrap_or_default())
    }
}

pub fn company(ciiu: &str, name: &str, assets: &str, liabilities: &str) -> Record {
    Record::new()
        .with("ciiu", ciiu)
        .with("raz_n_social", name)
        .with("total_activos", assets)
        .with("total_pasivos", liabilities)
}

/// `count` synthetic companies numbered from `start`.
pub fn companies(start: usize, count: usize) -> Vec<Record> {
    (start..start + count)
        .map(|i| {
            company(
                if i % 2 == 0 { "4111" } else { "4290" },
                &format!("Empresa {i}"),
                &format!("${},000", i + 1),
                &format!("${},500", i),
            )
        })
        .collect()
}
