// src/links/mod.rs
// =============================================================================
// This module finds links in text and rewrites them.
//
// Submodules:
// - extract: Finds anchors and bare URLs (two regex passes)
// - policy: Decides what each link turns into
// - rewrite: Runs both passes over a field and splices the results in
// =============================================================================

mod extract;
mod policy;
mod rewrite;

pub use rewrite::{rewrite, LinkTally};
