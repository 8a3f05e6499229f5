// src/links/rewrite.rs
// =============================================================================
// This module rewrites one text field.
//
// How it works, for each pass (anchors first, then bare URLs):
// 1. Extract every occurrence from the CURRENT text
// 2. Resolve all their distinct URLs (concurrently, through the cache)
// 3. Splice: copy the text between occurrences untouched, and put each
//    occurrence's replacement where its span was
// The output of pass 1 is the input of pass 2.
//
// Nothing outside an occurrence's span is ever modified.
// =============================================================================

use serde::Serialize;
use tracing::info;

use super::extract::{Occurrence, Pass};
use super::policy::{decide, Disposition};
use crate::resolver::{HttpTransport, Outcome, Resolver};

/// How many link occurrences ended up kept, retargeted or stripped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkTally {
    pub kept: usize,
    pub retargeted: usize,
    pub stripped: usize,
}

impl LinkTally {
    pub fn absorb(&mut self, other: &LinkTally) {
        self.kept += other.kept;
        self.retargeted += other.retargeted;
        self.stripped += other.stripped;
    }

    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Keep => self.kept += 1,
            Disposition::Retarget => self.retargeted += 1,
            Disposition::Strip => self.stripped += 1,
        }
    }
}

/// Result of rewriting one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// True if `text` differs from the input
    pub changed: bool,
    pub tally: LinkTally,
}

/// Rewrites dead and moved links in `text`.
pub async fn rewrite<T: HttpTransport>(text: &str, resolver: &Resolver<T>) -> Rewrite {
    let mut tally = LinkTally::default();

    // Neither pattern can match without "http" somewhere
    if !text.contains("http") {
        return Rewrite {
            text: text.to_string(),
            changed: false,
            tally,
        };
    }

    let mut current = text.to_string();
    for pass in Pass::ALL {
        if let Some(next) = rewrite_pass(&current, pass, resolver, &mut tally).await {
            current = next;
        }
    }

    let changed = current != text;
    Rewrite {
        text: current,
        changed,
        tally,
    }
}

// Runs one pass. Returns None when the pass found nothing to change.
async fn rewrite_pass<T: HttpTransport>(
    text: &str,
    pass: Pass,
    resolver: &Resolver<T>,
    tally: &mut LinkTally,
) -> Option<String> {
    let occurrences: Vec<Occurrence<'_>> = pass.extract(text).collect();
    if occurrences.is_empty() {
        return None;
    }

    let outcomes = resolver.outcomes(occurrences.iter().map(|o| o.url)).await;

    let mut output = String::with_capacity(text.len());
    let mut copied_up_to = 0;
    let mut altered = false;

    for occurrence in &occurrences {
        let outcome = outcomes.get(occurrence.url).unwrap_or(&Outcome::Live);
        info!(url = occurrence.url, %outcome, "link checked");

        let replacement = decide(occurrence, outcome);
        if replacement.alters(occurrence) {
            altered = true;
            tally.record(replacement.disposition);
            match replacement.disposition {
                Disposition::Strip => info!(url = occurrence.url, "removed link"),
                _ => info!(url = occurrence.url, with = %replacement.text, "replaced link"),
            }
        } else {
            tally.record(Disposition::Keep);
        }

        output.push_str(&text[copied_up_to..occurrence.span.start]);
        output.push_str(&replacement.text);
        copied_up_to = occurrence.span.end;
    }
    output.push_str(&text[copied_up_to..]);

    altered.then_some(output)
}
