//! Search command implementation

use crate::error::Result;
use crate::search::{QueryEngine, SearchOptions, SearchResults};
use serde::Serialize;

/// Search result for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    #[serde(flatten)]
    pub found: SearchResults,
}

/// Execute a search
pub async fn cmd_search(
    engine: &QueryEngine,
    query: &str,
    options: SearchOptions,
) -> Result<SearchReport> {
    let found = engine.search(query, &options).await?;
    Ok(SearchReport {
        query: query.to_string(),
        found,
    })
}

/// Print search results in human-readable form
pub fn print_search_results(report: &SearchReport) {
    println!("\n🔍 Query: {}\n", report.query);
    println!(
        "Found {} pages, showing {}:\n",
        report.found.count,
        report.found.results.len()
    );

    for (i, r) in report.found.results.iter().enumerate() {
        println!("{}. [relevance: {:.3}] {}{}", i + 1, r.relevance, r.site, r.uri);
        if !r.title.is_empty() {
            println!("   Title: {}", r.title);
        }
        println!("   Site: {}", r.site_name);
        if !r.snippet.is_empty() {
            println!("   {}\n", r.snippet);
        } else {
            println!();
        }
    }
}
