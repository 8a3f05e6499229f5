// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and validate them
// 2. Set up logging (tracing, to stderr)
// 3. Open the record store and build the HTTP transport + resolver
// 4. Run the scan, stopping cleanly between records on Ctrl-C
// 5. Print the report and exit with the proper code
//    (0 = clean run, 1 = finished with problems, 2 = error)
// =============================================================================

mod cli;
mod config;
mod error;
mod links;
mod resolver;
mod scan;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;
use config::Settings;
use resolver::{Resolver, ReqwestTransport};
use scan::ScanReport;
use store::JsonFileStore;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let settings = Settings::from_cli(&cli)?;
    init_tracing(settings.log_json);

    let options = settings.scan_options(&cli.command);

    let mut store = JsonFileStore::open(&settings.store_path)
        .await
        .with_context(|| {
            format!(
                "could not open record store {}",
                settings.store_path.display()
            )
        })?;
    info!(store = %store.path().display(), "record store loaded");

    let transport = ReqwestTransport::new(settings.timeout, settings.max_redirects)
        .context("could not build HTTP client")?;
    let resolver = Resolver::new(transport, settings.concurrency);

    // Ctrl-C sets a flag; the scan loop checks it between records so the
    // record in progress is always finished first
    let stop = Arc::new(AtomicBool::new(false));
    tokio::spawn({
        let stop = Arc::clone(&stop);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("stop requested, finishing the current record");
                stop.store(true, Ordering::Relaxed);
            }
        }
    });

    let report = scan::scan(&mut store, &resolver, &options, &stop).await;
    print_report(&report, settings.json)?;

    Ok(if report.is_clean() { 0 } else { 1 })
}

// Logs go to stderr so that stdout only carries the report (--json output
// stays machine-readable)
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "link_mender=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_report(report: &ScanReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        let icon = if report.is_clean() { "✅" } else { "⚠️ " };
        print!("{} {}", icon, report);
    }
    Ok(())
}
