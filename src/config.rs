// src/config.rs
// =============================================================================
// Turns parsed command-line arguments into validated settings.
//
// clap already checked the types; this is where we check the values (a page
// size of 0 would loop forever, a timeout of 0 would fail every request).
// =============================================================================

use anyhow::{ensure, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{Cli, Commands, ScanArgs};
use crate::scan::ScanOptions;
use crate::store::Collection;

/// Run-wide settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store_path: PathBuf,
    pub json: bool,
    pub log_json: bool,
    pub freshness: chrono::Duration,
    pub page_size: usize,
    pub concurrency: usize,
    pub timeout: Duration,
    pub max_redirects: usize,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        ensure!(cli.page_size > 0, "--page-size must be at least 1");
        ensure!(cli.concurrency > 0, "--concurrency must be at least 1");
        ensure!(cli.timeout_secs > 0, "--timeout-secs must be at least 1");
        // With no hops allowed every 301 would look like a dead end
        ensure!(cli.max_redirects > 0, "--max-redirects must be at least 1");

        Ok(Self {
            store_path: cli.store.clone(),
            json: cli.json,
            log_json: cli.log_json,
            freshness: chrono::Duration::days(i64::from(cli.freshness_days)),
            page_size: cli.page_size,
            concurrency: cli.concurrency,
            timeout: Duration::from_secs(cli.timeout_secs),
            max_redirects: cli.max_redirects,
        })
    }

    /// Scan options for the chosen subcommand.
    pub fn scan_options(&self, command: &Commands) -> ScanOptions {
        let (mut options, scan) = match command {
            Commands::Comments { scan, posts } => {
                let mut options = ScanOptions::new(Collection::Comments);
                options.containers = posts.clone();
                (options, scan)
            }
            Commands::Posts { scan, types } => {
                let mut options = ScanOptions::new(Collection::Posts);
                options.types = types.clone();
                (options, scan)
            }
        };

        apply_scan_args(&mut options, scan);
        options.freshness = self.freshness;
        options.page_size = self.page_size;
        options
    }
}

fn apply_scan_args(options: &mut ScanOptions, scan: &ScanArgs) {
    options.ids = scan.ids.clone();
    options.start = scan.start;
    options.limit = scan.limit;
    options.dry_run = scan.dry_run;
    options.force = scan.force;
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["link-mender", "--store", "s.json"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_comment_options() {
        let cli = parse(&["--page-size", "50", "comments", "--posts", "7,8", "--force"]);
        let settings = Settings::from_cli(&cli).unwrap();
        let options = settings.scan_options(&cli.command);

        assert_eq!(options.collection, Collection::Comments);
        assert_eq!(options.containers, vec![7, 8]);
        assert!(options.types.is_empty());
        assert!(options.force);
        assert_eq!(options.page_size, 50);
        assert_eq!(options.freshness, chrono::Duration::days(30));
    }

    #[test]
    fn test_post_options() {
        let cli = parse(&["--freshness-days", "1", "posts", "--types", "page", "--limit", "5"]);
        let settings = Settings::from_cli(&cli).unwrap();
        let options = settings.scan_options(&cli.command);

        assert_eq!(options.collection, Collection::Posts);
        assert_eq!(options.types, vec!["page"]);
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.freshness, chrono::Duration::days(1));
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let cli = parse(&["--page-size", "0", "posts"]);
        assert!(Settings::from_cli(&cli).is_err());
    }

    #[test]
    fn test_zero_max_redirects_is_rejected() {
        let cli = parse(&["--max-redirects", "0", "comments"]);
        let err = Settings::from_cli(&cli).unwrap_err();
        assert!(err.to_string().contains("--max-redirects"));

        let cli = parse(&["--max-redirects", "1", "comments"]);
        assert_eq!(Settings::from_cli(&cli).unwrap().max_redirects, 1);
    }
}
