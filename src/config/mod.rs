//! Configuration management for sitesearch
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::lemma::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sites to crawl and index
    #[serde(default)]
    pub sites: Vec<SiteConfig>,

    /// Web crawling configuration
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Morphology configuration
    #[serde(default)]
    pub morphology: MorphologyConfig,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// HTTP API configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// A site to index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Display name
    pub name: String,

    /// Root URL (scheme and host, trailing slash optional)
    pub url: String,
}

impl SiteConfig {
    /// Root URL without the trailing slash, as stored on the site row
    pub fn normalized_url(&self) -> String {
        normalize_host(&self.url)
    }
}

/// Strip a single trailing slash from a site URL
pub fn normalize_host(url: &str) -> String {
    url.strip_suffix('/').unwrap_or(url).to_string()
}

/// Web crawling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// User agent string
    #[serde(default = "default_crawl_user_agent")]
    pub user_agent: String,

    /// Referer header sent with every request
    #[serde(default = "default_crawl_referrer")]
    pub referrer: String,

    /// Request timeout in seconds
    #[serde(default = "default_crawl_timeout")]
    pub timeout_secs: u64,

    /// Delay between consecutive fetches of one site, in milliseconds
    #[serde(default = "default_crawl_delay_ms")]
    pub delay_ms: u64,

    /// Workers sharing one site's frontier
    #[serde(default = "default_crawl_workers_per_site")]
    pub workers_per_site: usize,

    /// Sites crawled at the same time
    #[serde(default = "default_crawl_max_concurrent_sites")]
    pub max_concurrent_sites: usize,

    /// URL schemes never followed (e.g. mailto, tel)
    #[serde(default = "default_crawl_excluded_schemes")]
    pub excluded_schemes: Vec<String>,

    /// File extensions never followed (lowercase, without the dot)
    #[serde(default = "default_crawl_excluded_extensions")]
    pub excluded_extensions: Vec<String>,
}

/// Morphology configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MorphologyConfig {
    /// Language whose alphabet and function words are used
    #[serde(default)]
    pub language: Language,

    /// Optional dictionary file: one `form<TAB>lemma<TAB>tag` entry per line
    #[serde(default)]
    pub dictionary_path: Option<PathBuf>,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Postings of the rarest lemma used to seed the candidate set
    #[serde(default = "default_search_seed_postings_limit")]
    pub seed_postings_limit: usize,

    /// Stop narrowing once the candidate set has at most this many pages
    #[serde(default = "default_search_narrowing_threshold")]
    pub narrowing_threshold: usize,

    /// Results per page when the caller gives no limit
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,

    /// Marker inserted before a highlighted term
    #[serde(default = "default_search_highlight_open")]
    pub highlight_open: String,

    /// Marker inserted after a highlighted term
    #[serde(default = "default_search_highlight_close")]
    pub highlight_close: String,
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. 127.0.0.1:8080
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for sitesearch data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sites: Vec::new(),
            crawl: CrawlConfig::default(),
            morphology: MorphologyConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            user_agent: default_crawl_user_agent(),
            referrer: default_crawl_referrer(),
            timeout_secs: default_crawl_timeout(),
            delay_ms: default_crawl_delay_ms(),
            workers_per_site: default_crawl_workers_per_site(),
            max_concurrent_sites: default_crawl_max_concurrent_sites(),
            excluded_schemes: default_crawl_excluded_schemes(),
            excluded_extensions: default_crawl_excluded_extensions(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            seed_postings_limit: default_search_seed_postings_limit(),
            narrowing_threshold: default_search_narrowing_threshold(),
            default_limit: default_search_limit(),
            highlight_open: default_search_highlight_open(),
            highlight_close: default_search_highlight_close(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_server_bind(),
        }
    }
}

impl Config {
    /// Get the default base directory for sitesearch (~/.sitesearch)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sitesearch")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            db_file: base.join("index.db"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Set up paths based on config file location
        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            db_file: base.join("index.db"),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Find the configured site whose root URL matches `scheme://host` of `url`
    pub fn site_for_url(&self, url: &Url) -> Option<&SiteConfig> {
        let host = url.host_str()?;
        let root = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };
        self.sites.iter().find(|s| s.normalized_url() == root)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for site in &self.sites {
            if site.name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "site '{}' must have a name",
                    site.url
                )));
            }

            let parsed = Url::parse(&site.url)
                .map_err(|e| Error::Config(format!("invalid site url '{}': {}", site.url, e)))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(Error::Config(format!(
                    "site url '{}' must use http or https",
                    site.url
                )));
            }
            if parsed.host_str().is_none() {
                return Err(Error::Config(format!("site url '{}' has no host", site.url)));
            }

            if !seen.insert(site.normalized_url()) {
                return Err(Error::Config(format!(
                    "site url '{}' is listed more than once",
                    site.url
                )));
            }
        }

        if self.crawl.workers_per_site == 0 {
            return Err(Error::Config(
                "crawl.workers_per_site must be positive".to_string(),
            ));
        }

        if self.crawl.max_concurrent_sites == 0 {
            return Err(Error::Config(
                "crawl.max_concurrent_sites must be positive".to_string(),
            ));
        }

        if self.search.seed_postings_limit == 0 {
            return Err(Error::Config(
                "search.seed_postings_limit must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
