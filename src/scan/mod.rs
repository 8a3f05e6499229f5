// src/scan/mod.rs
// =============================================================================
// This module runs a scan over a whole collection.
//
// Submodules:
// - driver: The page-by-page loop (filter, freshness, rewrite, persist)
// - report: Counters and the final summary
// =============================================================================

use chrono::Duration;
use std::collections::BTreeSet;

use crate::store::{Collection, RecordFilter};

mod driver;
mod report;

pub use driver::scan;
pub use report::ScanReport;

/// Default freshness window in days.
pub const DEFAULT_FRESHNESS_DAYS: u32 = 30;

/// Default number of records fetched per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Everything the operator asked for in one scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub collection: Collection,
    /// Only these record IDs (empty = all)
    pub ids: Vec<u64>,
    /// Only comments on these posts (empty = all)
    pub containers: Vec<u64>,
    /// Only posts of these types (empty = all)
    pub types: Vec<String>,
    /// Resume point: smallest record ID to visit
    pub start: Option<u64>,
    /// Maximum number of records to visit
    pub limit: Option<usize>,
    pub dry_run: bool,
    /// Check records even if their watermark is fresh
    pub force: bool,
    pub freshness: Duration,
    pub page_size: usize,
}

impl ScanOptions {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            ids: Vec::new(),
            containers: Vec::new(),
            types: Vec::new(),
            start: None,
            limit: None,
            dry_run: false,
            force: false,
            freshness: Duration::days(i64::from(DEFAULT_FRESHNESS_DAYS)),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Builds the store filter. Empty lists mean "no restriction".
    pub fn filter(&self) -> RecordFilter {
        fn non_empty<T: Ord + Clone>(values: &[T]) -> Option<BTreeSet<T>> {
            (!values.is_empty()).then(|| values.iter().cloned().collect())
        }

        RecordFilter {
            status: self.collection.published_status().to_string(),
            ids: non_empty(&self.ids),
            containers: non_empty(&self.containers),
            types: non_empty(&self.types),
            min_id: self.start,
        }
    }
}
