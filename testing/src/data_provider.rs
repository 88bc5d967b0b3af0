//! In-memory stand-in for the Catalog & Order Data Provider.
//!
//! Records live in a fixed list and are addressed by their 1-based position.
//! Lists are served in pages of ten as `{results, next}`; single records as
//! `{id, ...fields}`. An optional latency is applied on the Tokio clock so
//! loading states can be exercised with paused time.

use serde::Serialize;
use std::time::Duration;

/// Records per page
pub const PAGE_SIZE: usize = 10;

/// A record with its position-derived id flattened next to its fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<T> {
    /// 1-based position, rendered as a string
    pub id: String,
    /// The record's own fields
    #[serde(flatten)]
    pub fields: T,
}

/// One page of records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Records on this page
    pub results: Vec<Record<T>>,
    /// Whether a further page exists
    pub next: bool,
}

/// Fixed backing list served page by page
#[derive(Debug, Clone)]
pub struct PagedSource<T> {
    records: Vec<T>,
    latency: Duration,
}

impl<T: Clone> PagedSource<T> {
    /// Serve `records` with no latency
    #[must_use]
    pub const fn new(records: Vec<T>) -> Self {
        Self {
            records,
            latency: Duration::ZERO,
        }
    }

    /// Delay every async fetch by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of backing records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the backing list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record(position: usize, fields: &T) -> Record<T> {
        Record {
            id: (position + 1).to_string(),
            fields: fields.clone(),
        }
    }

    /// Page `number` (1-based; 0 is treated as 1)
    #[must_use]
    pub fn page(&self, number: usize) -> Page<T> {
        let start = PAGE_SIZE.saturating_mul(number.max(1) - 1);
        let end = start.saturating_add(PAGE_SIZE);
        let results = self
            .records
            .iter()
            .enumerate()
            .skip(start)
            .take(PAGE_SIZE)
            .map(|(position, fields)| Self::record(position, fields))
            .collect();
        Page {
            results,
            next: end < self.records.len(),
        }
    }

    /// Record at 1-based position `id`
    #[must_use]
    pub fn get(&self, id: usize) -> Option<Record<T>> {
        let position = id.checked_sub(1)?;
        self.records
            .get(position)
            .map(|fields| Self::record(position, fields))
    }

    /// First record whose secondary code equals `code`, by linear scan
    pub fn find_by_code<F>(&self, code: &str, code_of: F) -> Option<Record<T>>
    where
        F: Fn(&T) -> &str,
    {
        self.records
            .iter()
            .position(|fields| code_of(fields) == code)
            .and_then(|position| self.get(position + 1))
    }

    /// [`page`](Self::page) after the configured latency
    pub async fn fetch_page(&self, number: usize) -> Page<T> {
        tokio::time::sleep(self.latency).await;
        self.page(number)
    }

    /// [`get`](Self::get) after the configured latency
    pub async fn fetch(&self, id: usize) -> Option<Record<T>> {
        tokio::time::sleep(self.latency).await;
        self.get(id)
    }
}
