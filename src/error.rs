//! Custom error types for sitesearch

use thiserror::Error;

/// Main error type for sitesearch operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Morphology error: {0}")]
    Morphology(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Empty search query")]
    EmptyQuery,

    #[error("Page is outside the sites listed in the configuration file: {0}")]
    PageOutsideSites(String),

    #[error("Indexing is already running")]
    IndexingInProgress,

    #[error("Indexing is not running")]
    IndexingNotRunning,

    #[error("Already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error was caused by caller input rather than the system
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyQuery
                | Error::PageOutsideSites(_)
                | Error::IndexingInProgress
                | Error::IndexingNotRunning
        )
    }
}

/// Result type alias for sitesearch
pub type Result<T> = std::result::Result<T, Error>;
