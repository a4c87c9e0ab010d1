//! Memoization of whole fetches, keyed by [`FetchRequest`].
//!
//! The cache is owned by whoever drives the pipeline and passed in by `&mut`.
//! Entries optionally expire after a TTL; once `max_entries` is reached the
//! oldest entry is evicted.

use crate::domain::error::DashboardError;
use crate::domain::fetch::{FetchOutcome, FetchRequest, RecordFetcher};
use crate::ports::page_port::PagePort;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_ENTRIES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// `None` keeps entries for the life of the cache.
    pub ttl: Option<Duration>,
    pub max_entries: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: None,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    outcome: FetchOutcome,
    stored_at: Instant,
    /// Insertion order; eviction removes the lowest.
    seq: u64,
}

#[derive(Debug, Default)]
pub struct FetchCache {
    policy: CachePolicy,
    entries: HashMap<FetchRequest, CacheEntry>,
    next_seq: u64,
    hits: u64,
    misses: u64,
}

impl FetchCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn invalidate(&mut self, request: &FetchRequest) -> bool {
        self.entries.remove(request).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        match self.policy.ttl {
            Some(ttl) => now.duration_since(entry.stored_at) < ttl,
            None => true,
        }
    }

    /// Cached outcome for `request`, fetching through `fetcher` on a miss or
    /// after expiry. Partial outcomes are cached like complete ones.
    pub fn fetch_all(
        &mut self,
        fetcher: &RecordFetcher,
        source: &dyn PagePort,
        request: &FetchRequest,
    ) -> Result<&FetchOutcome, DashboardError> {
        let now = Instant::now();
        let fresh = self
            .entries
            .get(request)
            .is_some_and(|entry| self.is_fresh(entry, now));

        if fresh {
            self.hits += 1;
            tracing::info!(endpoint = %request.endpoint, "fetch served from cache");
        } else {
            self.misses += 1;
            let outcome = fetcher.fetch_all(source, request)?;
            self.insert(request.clone(), outcome, now);
        }

        self.entries
            .get(request)
            .map(|entry| &entry.outcome)
            .ok_or_else(|| DashboardError::InputMissing {
                reason: "cache entry vanished".into(),
            })
    }

    fn insert(&mut self, request: FetchRequest, outcome: FetchOutcome, now: Instant) {
        self.entries.remove(&request);
        if let Some(ttl) = self.policy.ttl {
            self.entries
                .retain(|_, entry| now.duration_since(entry.stored_at) < ttl);
        }
        while self.entries.len() >= self.policy.max_entries.max(1) {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
        self.entries.insert(
            request,
            CacheEntry {
                outcome,
                stored_at: now,
                seq: self.next_seq,
            },
        );
        self.next_seq += 1;
    }
}
