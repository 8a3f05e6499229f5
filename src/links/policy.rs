// src/links/policy.rs
// =============================================================================
// This module decides what a link turns into.
//
// | Outcome | Anchor                         | Bare URL                     |
// |---------|--------------------------------|------------------------------|
// | Live    | unchanged                      | unchanged                    |
// | Moved   | same anchor, href = new URL    | new URL, boundaries kept     |
// | Dead    | just the label                 | just the boundaries          |
//
// Unknown statuses (timeouts, 500s, ...) arrive here as Live, so a flaky
// network never deletes anything.
//
// decide() is a pure function: no I/O, no counters, easy to test.
// =============================================================================

use std::borrow::Cow;

use super::extract::{LinkKind, Occurrence};
use crate::resolver::Outcome;

/// What happened to one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Keep,
    Retarget,
    Strip,
}

/// The text that replaces an occurrence's span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement<'t> {
    pub disposition: Disposition,
    pub text: Cow<'t, str>,
}

impl Replacement<'_> {
    /// True if splicing this in actually changes the text.
    pub fn alters(&self, occurrence: &Occurrence<'_>) -> bool {
        self.text != occurrence.matched
    }
}

/// Decides the replacement for `occurrence` given its URL's outcome.
pub fn decide<'t>(occurrence: &Occurrence<'t>, outcome: &Outcome) -> Replacement<'t> {
    match outcome {
        Outcome::Live => Replacement {
            disposition: Disposition::Keep,
            text: Cow::Borrowed(occurrence.matched),
        },

        // Only the URL itself is swapped: the anchor's other attributes and
        // label, or the bare URL's boundaries, stay as they were
        Outcome::Moved(destination) => Replacement {
            disposition: Disposition::Retarget,
            text: Cow::Owned(format!(
                "{}{}{}",
                occurrence.head(),
                destination,
                occurrence.tail()
            )),
        },

        Outcome::Dead => {
            let text = match occurrence.kind {
                LinkKind::Anchor => Cow::Borrowed(occurrence.label.unwrap_or("")),
                LinkKind::Bare => {
                    Cow::Owned(format!("{}{}", occurrence.before, occurrence.after))
                }
            };
            Replacement {
                disposition: Disposition::Strip,
                text,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::extract::Pass;

    fn first(pass: Pass, text: &str) -> Occurrence<'_> {
        pass.extract(text).next().unwrap()
    }

    #[test]
    fn test_live_keeps_span() {
        let occ = first(Pass::Anchors, r#"<a href="http://a.example/">A</a>"#);
        let replacement = decide(&occ, &Outcome::Live);
        assert_eq!(replacement.disposition, Disposition::Keep);
        assert_eq!(replacement.text, occ.matched);
        assert!(!replacement.alters(&occ));
    }

    #[test]
    fn test_moved_anchor_keeps_label_and_attributes() {
        let occ = first(
            Pass::Anchors,
            r#"<a target="_blank" href="http://old.example/a">http://old.example/a</a>"#,
        );
        let replacement = decide(&occ, &Outcome::Moved("http://new.example/a".to_string()));
        assert_eq!(replacement.disposition, Disposition::Retarget);
        // The label is never touched, even when it repeats the URL
        assert_eq!(
            replacement.text,
            r#"<a target="_blank" href="http://new.example/a">http://old.example/a</a>"#
        );
    }

    #[test]
    fn test_moved_bare_keeps_boundaries() {
        let occ = first(Pass::BareUrls, "go http://old.example/a, now");
        let replacement = decide(&occ, &Outcome::Moved("https://new.example/a".to_string()));
        assert_eq!(replacement.text, " https://new.example/a, ");
    }

    #[test]
    fn test_dead_anchor_becomes_label() {
        let occ = first(Pass::Anchors, r#"<a href="http://dead.example/a">Read more</a>"#);
        let replacement = decide(&occ, &Outcome::Dead);
        assert_eq!(replacement.disposition, Disposition::Strip);
        assert_eq!(replacement.text, "Read more");
    }

    #[test]
    fn test_dead_bare_keeps_only_boundaries() {
        let occ = first(Pass::BareUrls, "see http://dead.example/x. Thanks");
        let replacement = decide(&occ, &Outcome::Dead);
        assert_eq!(replacement.text, " . ");
    }

    #[test]
    fn test_moved_to_same_url_does_not_alter() {
        let occ = first(Pass::BareUrls, "http://same.example/");
        let replacement = decide(&occ, &Outcome::Moved("http://same.example/".to_string()));
        assert!(!replacement.alters(&occ));
    }
}
