// src/links/extract.rs
// =============================================================================
// This module finds links inside free-form text.
//
// There are two kinds of links, found by two regex passes:
// 1. Anchors:   <a class="x" href="http://...">Label</a>
// 2. Bare URLs: ...see http://example.com/page. Thanks
//
// The passes are meant to run one after the other, the second one over the
// OUTPUT of the first (see links/rewrite.rs). That way a URL sitting inside
// an href is handled once, by the anchor pass, and never again by the bare
// pass.
//
// Each match becomes an Occurrence that borrows from the text. Nothing is
// decoded or normalized: the URL and label are exactly what the author typed.
//
// Rust concepts:
// - Lifetimes: Occurrence<'t> cannot outlive the text it points into
// - impl Iterator: Lazy, one-shot sequences of matches
// - once_cell::sync::Lazy: Compile each regex once, on first use
// =============================================================================

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

// href value in single or double quotes, any attributes around it, and a
// label with no nested tags
const ANCHOR_PATTERN: &str =
    r#"<a[^>]*href=['"](?P<url>[^'"]+)['"][^>]*>(?P<label>[^<]+)</a>"#;

// Whitespace (or start of text) on the left; whitespace (or end of text) on
// the right. Sentence punctuation right before the right boundary goes into
// `after`, so "see http://x.example/a. Thanks" captures "http://x.example/a".
// A `)` that closes a `(` inside the URL is given back to the URL afterwards
// (see claim_closing_parens).
const BARE_URL_PATTERN: &str =
    r"(?P<before>^|\s)(?P<url>https?\S+?)(?P<after>[.,;:!?)]*(?:\s|$))";

/// Which pattern found an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Anchor,
    Bare,
}

/// The two extraction passes, in the order they must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Anchors,
    BareUrls,
}

impl Pass {
    pub const ALL: [Pass; 2] = [Pass::Anchors, Pass::BareUrls];

    /// Lazily yields this pass's occurrences in `text`, left to right.
    pub fn extract(self, text: &str) -> impl Iterator<Item = Occurrence<'_>> + '_ {
        let (regex, kind) = match self {
            Pass::Anchors => (anchor_regex(), LinkKind::Anchor),
            Pass::BareUrls => (bare_url_regex(), LinkKind::Bare),
        };
        regex
            .captures_iter(text)
            .filter_map(move |caps| Occurrence::from_captures(kind, &caps))
    }
}

/// One link found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence<'t> {
    pub kind: LinkKind,
    /// Byte range of the whole match in the scanned text
    pub span: Range<usize>,
    /// The whole match, e.g. `<a href="...">Label</a>` or ` http://x `
    pub matched: &'t str,
    /// The URL exactly as written
    pub url: &'t str,
    /// Visible text of an anchor; None for bare URLs
    pub label: Option<&'t str>,
    /// Boundary text before a bare URL (empty for anchors)
    pub before: &'t str,
    /// Boundary text after a bare URL (empty for anchors)
    pub after: &'t str,
    // Where `url` sits inside `matched`
    url_in_match: Range<usize>,
}

impl<'t> Occurrence<'t> {
    fn from_captures(kind: LinkKind, caps: &Captures<'t>) -> Option<Self> {
        let whole = caps.get(0)?;
        let url = caps.name("url")?;
        let matched = whole.as_str();
        let text_of = |name: &str| caps.name(name).map(|m| m.as_str());

        let url_in_match = (url.start() - whole.start())..(url.end() - whole.start());
        // For bare URLs, `after` always runs to the end of the match, so
        // moving the URL's end moves the start of `after` with it
        let (url_in_match, after) = match kind {
            LinkKind::Anchor => (url_in_match, ""),
            LinkKind::Bare => {
                let url_in_match = claim_closing_parens(matched, url_in_match);
                let after = &matched[url_in_match.end..];
                (url_in_match, after)
            }
        };

        Some(Occurrence {
            kind,
            span: whole.range(),
            matched,
            url: &matched[url_in_match.clone()],
            label: text_of("label"),
            before: text_of("before").unwrap_or(""),
            after,
            url_in_match,
        })
    }

    /// Everything in the match before the URL.
    ///
    /// For anchors that is `<a ... href="`; for bare URLs it is `before`.
    pub fn head(&self) -> &'t str {
        &self.matched[..self.url_in_match.start]
    }

    /// Everything in the match after the URL.
    ///
    /// For anchors that is `" ...>Label</a>`; for bare URLs it is `after`.
    pub fn tail(&self) -> &'t str {
        &self.matched[self.url_in_match.end..]
    }
}

// Extends a bare URL over the `)` characters right after it, one for each
// `(` inside the URL that is still open.
//
// "http://w.example/Rust_(lang)" keeps its last paren, while the paren in
// "(see http://w.example/a)" stays outside the URL.
fn claim_closing_parens(matched: &str, mut url: Range<usize>) -> Range<usize> {
    let mut unclosed = 0usize;
    for c in matched[url.clone()].chars() {
        match c {
            '(' => unclosed += 1,
            ')' => unclosed = unclosed.saturating_sub(1),
            _ => {}
        }
    }

    while unclosed > 0 && matched[url.end..].starts_with(')') {
        url.end += 1;
        unclosed -= 1;
    }
    url
}

// These patterns are constants, so compiling them can only fail if we wrote
// them wrong - a programmer error, caught by the tests below.
static ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(ANCHOR_PATTERN).expect("anchor pattern is valid"));

static BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(BARE_URL_PATTERN).expect("bare url pattern is valid"));

fn anchor_regex() -> &'static Regex {
    &ANCHOR
}

fn bare_url_regex() -> &'static Regex {
    &BARE
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does Occurrence<'t> mean?
//    - 't is a lifetime: every &str inside points into the scanned text
//    - The compiler refuses to let an Occurrence outlive that text
//    - No copying: extracting links allocates nothing per match
//
// 2. Why return impl Iterator instead of Vec?
//    - captures_iter() finds matches one at a time, on demand
//    - The caller decides whether to collect, count, or stop early
//
// 3. Lazy vs greedy in regex (\S+? vs \S+)
//    - \S+ grabs as much as possible, so it would swallow a final "."
//    - \S+? grabs as little as possible and stops at the first spot where
//      the `after` group (punctuation, then whitespace) can match
// -----------------------------------------------------------------------------
