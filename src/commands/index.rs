//! Index commands implementation

use crate::error::Result;
use crate::indexer::{Indexer, ProgressSnapshot, RescanOutcome, Statistics};
use crate::progress::add_spinner;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a full indexing run
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub stopped: bool,
    pub progress: ProgressSnapshot,
    pub statistics: Statistics,
}

/// Rebuild every configured site, stopping cleanly on Ctrl-C
pub async fn cmd_index(indexer: &Indexer) -> Result<IndexReport> {
    indexer.start()?;

    let spinner = add_spinner("Indexing...");
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let mut stopped = false;

    while indexer.is_indexing() {
        tokio::select! {
            _ = &mut ctrl_c, if !stopped => {
                stopped = true;
                info!("Interrupted, stopping after in-flight pages");
                if let Err(e) = indexer.stop() {
                    warn!("{}", e);
                }
            }
            _ = ticker.tick() => {}
        }

        let progress = indexer.progress();
        spinner.set_message(format!(
            "{} pages indexed, {} failed, {}/{} sites done",
            progress.pages_indexed,
            progress.pages_failed,
            progress.sites_finished,
            indexer.config().sites.len()
        ));
    }

    indexer.wait().await;
    spinner.finish_and_clear();

    Ok(IndexReport {
        stopped,
        progress: indexer.progress(),
        statistics: indexer.statistics().await?,
    })
}

/// Re-index a single page
pub async fn cmd_index_page(indexer: &Indexer, url: &str) -> Result<RescanOutcome> {
    indexer.rescan_page(url).await
}

/// Print an indexing report in human-readable form
pub fn print_index_report(report: &IndexReport) {
    if report.stopped {
        println!("⚠ Indexing stopped by user");
    } else {
        println!("✓ Indexing complete");
    }
    println!(
        "  Pages indexed: {} ({} failed fetches)",
        report.progress.pages_indexed, report.progress.pages_failed
    );
    for site in &report.statistics.detailed {
        match &site.error {
            Some(error) => println!("  {} [{}]: {}", site.url, site.status, error),
            None => println!(
                "  {} [{}]: {} pages, {} lemmas",
                site.url, site.status, site.pages, site.lemmas
            ),
        }
    }
}

/// Print a single-page rescan outcome
pub fn print_rescan_outcome(url: &str, outcome: &RescanOutcome) {
    match outcome {
        RescanOutcome::Indexed { lemmas, .. } => {
            println!("✓ Re-indexed {} ({} lemmas)", url, lemmas)
        }
        RescanOutcome::SiteNotIndexed => {
            println!("The site of {} has not been indexed yet; run 'sitesearch index' first", url)
        }
        RescanOutcome::FetchFailed { error } => println!("✗ Could not fetch {}: {}", url, error),
    }
}
