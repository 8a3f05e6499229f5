// src/scan/driver.rs
// =============================================================================
// This module is the scan loop.
//
// How it works:
// 1. Build the filter once (status, IDs, posts/types, start ID)
// 2. Fetch a page of matching records, ascending by ID
// 3. For each record:
//    - stop if Ctrl-C was pressed or --limit records were visited
//    - skip it if its watermark says it was checked recently
//    - rewrite each scanned field
//    - unless --dry-run: save changed fields, then refresh the watermark
// 4. Flush the store, so the page's writes hit disk together
// 5. Fetch the next page (IDs after the last one seen) until none are left
//
// The flush in step 4 also runs when the scan stops early (Ctrl-C, --limit).
// If it fails, the page's writes are dropped and the scan stops.
//
// Ascending IDs + --start make an interrupted scan resumable: pass the last
// ID from the logs as --start and the scan picks up there.
//
// The Resolver is shared by every record, so a URL that appears in a
// thousand comments is still only requested once per run.
// =============================================================================

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::report::{ScanReport, StopReason};
use super::ScanOptions;
use crate::links::rewrite;
use crate::resolver::{HttpTransport, Resolver};
use crate::store::{Record, RecordStore, LAST_CHECKED_KEY};

/// Watermark timestamp format (UTC).
pub const WATERMARK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Runs one scan and returns its report.
///
/// `stop` is checked between records, never in the middle of one, so a
/// record is either fully processed (fields and watermark) or not touched.
pub async fn scan<S, T>(
    store: &mut S,
    resolver: &Resolver<T>,
    options: &ScanOptions,
    stop: &AtomicBool,
) -> ScanReport
where
    S: RecordStore,
    T: HttpTransport,
{
    let collection = options.collection;
    let filter = options.filter();
    let mut report = ScanReport::new(collection, options.dry_run);
    let mut cursor: Option<u64> = None;

    info!(
        collection = collection.noun(),
        dry_run = options.dry_run,
        force = options.force,
        "starting scan"
    );

    report.stopped = loop {
        let page = match store
            .fetch_page(collection, &filter, cursor, options.page_size)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                error!(error = %e, after = ?cursor, "could not fetch records");
                break StopReason::StoreFailure(e.to_string());
            }
        };

        let Some(last) = page.last() else {
            break StopReason::Exhausted;
        };
        cursor = Some(last.id);
        let full_page = page.len() >= options.page_size;

        let mut interrupted = None;
        for record in &page {
            if stop.load(Ordering::Relaxed) {
                interrupted = Some(StopReason::Cancelled);
                break;
            }
            if options.limit.is_some_and(|limit| report.visited >= limit) {
                interrupted = Some(StopReason::Limit);
                break;
            }

            report.visited += 1;
            check_record(store, resolver, options, record, &mut report)
                .instrument(info_span!("record", id = record.id))
                .await;
        }

        if let Err(e) = store.flush().await {
            error!(error = %e, through = last.id, "could not save this page");
            break StopReason::StoreFailure(e.to_string());
        }

        if let Some(reason) = interrupted {
            break reason;
        }
        if !full_page {
            break StopReason::Exhausted;
        }
    };

    report.requests_sent = resolver.requests_sent();
    info!(
        visited = report.visited,
        checked = report.checked,
        skipped = report.skipped,
        failed = report.failed,
        "scan finished"
    );
    report
}

async fn check_record<S, T>(
    store: &mut S,
    resolver: &Resolver<T>,
    options: &ScanOptions,
    record: &Record,
    report: &mut ScanReport,
) where
    S: RecordStore,
    T: HttpTransport,
{
    let collection = options.collection;

    if !options.force {
        match store.get_meta(collection, record.id, LAST_CHECKED_KEY).await {
            Ok(Some(watermark)) if is_fresh(&watermark, Utc::now(), options.freshness) => {
                debug!(%watermark, "checked recently, skipping");
                report.skipped += 1;
                return;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "could not read watermark, checking anyway"),
        }
    }

    let mut staged = BTreeMap::new();
    for &field in collection.fields() {
        let Some(value) = record.fields.get(field) else {
            continue;
        };

        let result = rewrite(value, resolver)
            .instrument(info_span!("field", field))
            .await;
        report.links.absorb(&result.tally);

        if result.changed {
            report.count_change(field);
            staged.insert(field.to_string(), result.text);
        }
    }
    report.checked += 1;

    if options.dry_run {
        return;
    }

    if !staged.is_empty() {
        if let Err(e) = store.update_fields(collection, record.id, &staged).await {
            // Leave the watermark alone so the next run tries again
            error!(error = %e, "could not update record");
            report.failed += 1;
            return;
        }
    }

    // Clean records get a watermark too, so they are skipped next time
    let now = Utc::now().format(WATERMARK_FORMAT).to_string();
    if let Err(e) = store
        .set_meta(collection, record.id, LAST_CHECKED_KEY, &now)
        .await
    {
        error!(error = %e, "could not write watermark");
        report.failed += 1;
    }
}

// A watermark we cannot parse counts as "never checked"
fn is_fresh(watermark: &str, now: DateTime<Utc>, window: Duration) -> bool {
    match NaiveDateTime::parse_from_str(watermark, WATERMARK_FORMAT) {
        Ok(checked) => Utc.from_utc_datetime(&checked) + window > now,
        Err(_) => false,
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is `report.stopped = loop { ... break value }`?
//    - `loop` is an expression, so `break value` gives it a result
//    - Here the result is the StopReason stored in the report
//    - The inner `for` can only break itself, so it leaves its reason in
//      `interrupted` and the outer loop breaks with it after the flush
//
// 2. What does .instrument(span) do?
//    - Every log event emitted while the future runs carries the span's
//      fields, so "link checked" lines show the record id and field
//
// 3. Why &AtomicBool for stopping?
//    - The Ctrl-C handler runs in another task and only needs to flip a flag
//    - Atomics can be shared and written without a Mutex
// -----------------------------------------------------------------------------
