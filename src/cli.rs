// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Shape:
//   link-mender [GLOBAL OPTIONS] comments [--ids ..] [--posts ..] [SCAN OPTIONS]
//   link-mender [GLOBAL OPTIONS] posts    [--ids ..] [--types ..] [SCAN OPTIONS]
//
// Global options (store path, freshness window, HTTP settings) go BEFORE the
// subcommand. The store path can also come from LINK_MENDER_STORE.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::scan::{DEFAULT_FRESHNESS_DAYS, DEFAULT_PAGE_SIZE};

#[derive(Parser, Debug)]
#[command(
    name = "link-mender",
    version,
    about = "Finds dead and moved links in stored comments and posts and rewrites them",
    long_about = "link-mender checks every link in published comments and posts. Dead links \
                  (404, or a host that no longer exists) are replaced by their label, links that \
                  moved permanently (301) are pointed at their new address, and everything else \
                  is left alone. Records checked recently are skipped, so repeated runs are cheap."
)]
pub struct Cli {
    /// JSON record store to scan and update
    #[arg(long, env = "LINK_MENDER_STORE")]
    pub store: PathBuf,

    /// Print the final report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Write logs (stderr) as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Skip records checked within this many days (unless --force)
    #[arg(long, env = "LINK_MENDER_FRESHNESS_DAYS", default_value_t = DEFAULT_FRESHNESS_DAYS)]
    pub freshness_days: u32,

    /// Records fetched from the store per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Distinct URLs checked at the same time
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Redirect hops followed when looking for a moved link's destination
    #[arg(long, default_value_t = 5)]
    pub max_redirects: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan approved comments (author URL and content)
    ///
    /// Example: link-mender --store site.json comments --posts 12,40 --dry-run
    Comments {
        #[command(flatten)]
        scan: ScanArgs,

        /// Only comments on these post IDs (comma separated)
        #[arg(long, value_delimiter = ',')]
        posts: Vec<u64>,
    },

    /// Scan published posts (content and excerpt)
    ///
    /// Example: link-mender --store site.json posts --types page --limit 500
    Posts {
        #[command(flatten)]
        scan: ScanArgs,

        /// Only posts of these types (comma separated)
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,
    },
}

/// Options shared by both subcommands.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Only these record IDs (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<u64>,

    /// Start at this record ID (use it to resume an interrupted scan)
    #[arg(long)]
    pub start: Option<u64>,

    /// Stop after visiting this many records
    #[arg(long)]
    pub limit: Option<usize>,

    /// Check and report, but do not modify anything
    #[arg(long)]
    pub dry_run: bool,

    /// Check records even if they were checked recently
    #[arg(long)]
    pub force: bool,
}
