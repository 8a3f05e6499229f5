// src/scan/report.rs
// =============================================================================
// Counters collected during one scan, printed once at the end.
//
// The same struct is printed two ways:
// - As a human-readable summary (Display)
// - As JSON (--json), via serde
// =============================================================================

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::links::LinkTally;
use crate::store::Collection;

/// Why the scan loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every matching record was visited
    Exhausted,
    /// The --limit was reached
    Limit,
    /// The operator pressed Ctrl-C
    Cancelled,
    /// The store could not deliver the next page
    StoreFailure(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub collection: Collection,
    pub dry_run: bool,
    /// Records taken from the store (counts toward --limit)
    pub visited: usize,
    /// Records whose fields were actually checked
    pub checked: usize,
    /// Records skipped because they were checked recently
    pub skipped: usize,
    /// Records whose update or watermark could not be written
    pub failed: usize,
    /// Number of records whose field changed, per field
    pub fields_changed: BTreeMap<&'static str, usize>,
    pub links: LinkTally,
    /// HEAD requests sent (after de-duplication)
    pub requests_sent: usize,
    pub stopped: StopReason,
}

impl ScanReport {
    pub fn new(collection: Collection, dry_run: bool) -> Self {
        Self {
            collection,
            dry_run,
            visited: 0,
            checked: 0,
            skipped: 0,
            failed: 0,
            fields_changed: collection.fields().iter().map(|&f| (f, 0)).collect(),
            links: LinkTally::default(),
            requests_sent: 0,
            stopped: StopReason::Exhausted,
        }
    }

    pub(super) fn count_change(&mut self, field: &'static str) {
        *self.fields_changed.entry(field).or_insert(0) += 1;
    }

    pub fn changed(&self, field: &str) -> usize {
        self.fields_changed.get(field).copied().unwrap_or(0)
    }

    /// True if nothing went wrong: no failed writes, no store failure, no
    /// Ctrl-C.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && matches!(self.stopped, StopReason::Exhausted | StopReason::Limit)
    }

    /// The one-line summary, e.g.
    /// "Comment scan complete. 1 author_url fields updated; 3 content fields updated."
    pub fn summary_line(&self) -> String {
        let counts: Vec<String> = self
            .collection
            .fields()
            .iter()
            .map(|field| format!("{} {} fields updated", self.changed(field), field))
            .collect();

        let mode = if self.dry_run { " (dry run)" } else { "" };
        format!(
            "{} scan complete{}. {}.",
            self.collection.noun(),
            mode,
            counts.join("; ")
        )
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary_line())?;
        writeln!(
            f,
            "   Records: {} visited, {} checked, {} skipped (fresh), {} failed",
            self.visited, self.checked, self.skipped, self.failed
        )?;
        writeln!(
            f,
            "   Links: {} kept, {} replaced, {} removed ({} requests)",
            self.links.kept, self.links.retargeted, self.links.stripped, self.requests_sent
        )?;
        match &self.stopped {
            StopReason::Exhausted => Ok(()),
            StopReason::Limit => writeln!(f, "   Stopped early: limit reached"),
            StopReason::Cancelled => writeln!(f, "   Stopped early: cancelled"),
            StopReason::StoreFailure(reason) => writeln!(f, "   Stopped early: {reason}"),
        }
    }
}
