//! sitesearch CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use sitesearch::{
    commands::{
        cmd_index, cmd_index_page, cmd_init, cmd_search, cmd_stats, print_index_report,
        print_rescan_outcome, print_search_results, print_statistics,
    },
    config::Config,
    error::Result,
    indexer::Indexer,
    lemma::Lemmatizer,
    progress::LogWriterFactory,
    search::{QueryEngine, SearchOptions},
    server::{run_server, AppState},
    store::IndexStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sitesearch")]
#[command(version, about = "Site crawler and lemma-based search engine", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize sitesearch configuration and database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Rebuild the index of every configured site (Ctrl-C stops)
    Index,

    /// Re-index a single page of a configured site
    IndexPage {
        /// Absolute URL of the page
        url: String,
    },

    /// Search the index
    Search {
        /// The search query
        query: String,

        /// Restrict results to one site (its root URL)
        #[arg(long)]
        site: Option<String>,

        /// Number of results to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show index statistics
    Stats,

    /// Serve the HTTP API
    Serve {
        /// Address to bind (overrides the config file)
        #[arg(long, env = "SITESEARCH_BIND")]
        bind: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory))
        .with(filter)
        .init();

    // Handle init command specially (doesn't need existing config)
    if let Commands::Init { force } = cli.command {
        return handle_init(cli.config.as_deref(), force).await;
    }

    // Handle completions command (doesn't need config/db)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "sitesearch", &mut std::io::stdout());
        return Ok(());
    }

    // Load configuration
    let config = Arc::new(load_config(cli.config.as_deref())?);

    // Initialize components
    let store = IndexStore::connect(&config).await?;
    let lemmatizer = Lemmatizer::from_config(&config.morphology)?;
    let engine = QueryEngine::new(store.clone(), lemmatizer.clone(), config.search.clone());
    let indexer = Arc::new(Indexer::new(config.clone(), store, lemmatizer)?);

    // Handle commands
    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Index => {
            let report = cmd_index(&indexer).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_index_report(&report);
            }
        }

        Commands::IndexPage { url } => {
            let outcome = cmd_index_page(&indexer, &url).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_rescan_outcome(&url, &outcome);
            }
        }

        Commands::Search {
            query,
            site,
            offset,
            limit,
        } => {
            let options = SearchOptions {
                site,
                offset,
                limit,
            };
            let report = cmd_search(&engine, &query, options).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_search_results(&report);
            }
        }

        Commands::Stats => {
            let stats = cmd_stats(&indexer).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_statistics(&stats);
            }
        }

        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            run_server(&bind, AppState { indexer, engine }).await?;
        }
    }

    Ok(())
}

/// Load the config file given on the command line, or the default one
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => {
            let config = Config::load_from(None)?;
            config.validate()?;
            Ok(config)
        }
    }
}

async fn handle_init(path: Option<&Path>, force: bool) -> Result<()> {
    // A .toml path names the config file; anything else is its directory
    let base_dir = path.map(|p| {
        if p.extension().is_some_and(|e| e == "toml") {
            p.parent()
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_base_dir)
        } else {
            p.to_path_buf()
        }
    });

    let config = cmd_init(base_dir, force).await?;

    println!("✓ sitesearch initialized successfully");
    println!("  Config: {}", config.paths.config_file.display());
    println!("  Database: {}", config.paths.db_file.display());
    println!("\nNext steps:");
    println!("  1. Add [[sites]] entries (name, url) to the config file");
    println!("  2. Build the index: sitesearch index");
    println!("  3. Search it: sitesearch search \"your query\"");
    Ok(())
}
