//! Stats command implementation

use crate::error::Result;
use crate::indexer::{Indexer, Statistics};

/// Collect index statistics
pub async fn cmd_stats(indexer: &Indexer) -> Result<Statistics> {
    indexer.statistics().await
}

/// Print statistics in human-readable form
pub fn print_statistics(stats: &Statistics) {
    println!("\n📊 sitesearch Statistics\n");
    println!("Sites: {}", stats.total.sites);
    println!("Pages: {}", stats.total.pages);
    println!("Lemmas: {}", stats.total.lemmas);
    println!(
        "Indexing: {}",
        if stats.total.indexing { "running" } else { "idle" }
    );

    if stats.detailed.is_empty() {
        println!("\nNo sites configured. Add [[sites]] entries to the config file.");
        return;
    }

    println!();
    for site in &stats.detailed {
        println!("{} ({})", site.name, site.url);
        println!("  Status: {}", site.status);
        if let Some(time) = &site.status_time {
            println!("  Since: {}", time);
        }
        if let Some(error) = &site.error {
            println!("  Error: {}", error);
        }
        println!("  Pages: {}", site.pages);
        println!("  Lemmas: {}", site.lemmas);
        println!();
    }
}
