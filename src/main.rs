// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging and the shared HTTP client
// 3. Wire Ctrl-C (and an optional deadline) to a cancellation token
// 4. Analyze the page and print the report
// 5. Exit with proper code (0 = report, 1 = page returned HTTP error, 2 = error)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod analyzer;  // src/analyzer/ - markup facts and link probing
mod cli;       // src/cli.rs - command-line parsing
mod config;    // src/config.rs - defaults and settings
mod error;     // src/error.rs - error types
mod fetch;     // src/fetch.rs - downloads the target page
mod inspector; // src/inspector.rs - URL in, report out
mod logging;   // src/logging.rs - env_logger setup
mod report;    // src/report.rs - the PageReport type
mod transport; // src/transport/ - pluggable HTTP client

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use error::AnalyzeError;
use inspector::Inspector;
use report::PageReport;
use transport::ReqwestTransport;

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

// Returns:
//   Ok(0) = report printed
//   Ok(1) = the page answered with an HTTP error status
//   Ok(2) = the analysis failed for any other reason
//   Err = start-up or output failure
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init_logger(cli.log_level.into())?;

    match cli.command {
        Commands::Report {
            url,
            json,
            deadline_secs,
            settings,
        } => {
            let config = settings.into_config();
            let transport = Arc::new(ReqwestTransport::new(&config)?);
            let inspector = Inspector::new(transport, config);

            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());
            if let Some(secs) = deadline_secs {
                cancel_after(cancel.clone(), Duration::from_secs(secs));
            }

            handle_report(&inspector, &cancel, &url, json).await
        }
    }
}

async fn handle_report(
    inspector: &Inspector,
    cancel: &CancellationToken,
    url: &str,
    json: bool,
) -> Result<i32> {
    match inspector.get_report(cancel, url).await {
        Ok(report) => {
            print_report(&report, json)?;
            Ok(0)
        }
        Err(e) => {
            eprintln!("{}", e.flash_message());
            Ok(match e {
                AnalyzeError::Http { .. } => 1,
                _ => 2,
            })
        }
    }
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling analysis");
            cancel.cancel();
        }
    });
}

fn cancel_after(cancel: CancellationToken, deadline: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        log::warn!("Deadline of {:?} reached, cancelling analysis", deadline);
        cancel.cancel();
    });
}

fn print_report(report: &PageReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_table(report);
    }
    Ok(())
}

// Prints the report as a human-readable table in the terminal
fn print_table(report: &PageReport) {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };

    println!("📄 {}", report.source_url());
    println!("{}", "=".repeat(50));
    println!("{:<22} {}", "HTML version", report.html_version());
    println!("{:<22} {}", "Title", report.title());
    for (level, count) in report.heading_counts() {
        println!("{:<22} {}", format!("<{}> headings", level), count);
    }
    println!("{:<22} {}", "Internal links", report.internal_links());
    println!("{:<22} {}", "External links", report.external_links());
    println!("{:<22} {}", "Unreachable links", report.unreachable_links());
    println!("{:<22} {}", "Login form", yes_no(report.has_login_form()));
}
