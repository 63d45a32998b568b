//! sitesearch - A site crawler and lemma-based search engine
//!
//! This crate provides:
//! - Concurrent crawling of a configured set of websites
//! - Lemmatization of page text into dictionary forms
//! - An inverted index of lemmas over SQLite
//! - Ranked multi-term search with highlighted snippets
//! - An HTTP API and a CLI over the same operations

pub mod commands;
pub mod config;
pub mod crawl;
pub mod error;
pub mod indexer;
pub mod lemma;
pub mod parse;
pub mod progress;
pub mod search;
pub mod server;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
