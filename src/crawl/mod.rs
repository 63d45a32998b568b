//! Page fetching and link filtering
//!
//! This module provides:
//! - The `Fetcher` seam and its reqwest implementation
//! - Same-site link filtering for the crawl frontier
//! - A politeness delay between fetches of one site

mod rate_limit;

pub use rate_limit::*;

use crate::config::CrawlConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, REFERER};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub status: u16,
    pub content: String,
}

/// Page fetching contract
///
/// Yields the status and body of a text page, or an error for network
/// failures, non-success statuses and non-text content.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;
}

/// HTTP fetcher backed by reqwest
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher sending the configured user agent and referrer
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if !config.referrer.is_empty() {
            let referrer = HeaderValue::from_str(&config.referrer)
                .map_err(|e| Error::Config(format!("invalid referrer: {}", e)))?;
            headers.insert(REFERER, referrer);
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        debug!("Fetching: {}", url);

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP {}: {}", status, url)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());
        if let Some(ct) = &content_type {
            if !is_text_content(ct) {
                return Err(Error::Fetch(format!("Unsupported content type {}: {}", ct, url)));
            }
        }

        let content = response.text().await?;

        Ok(FetchedPage {
            url: url.clone(),
            status: status.as_u16(),
            content,
        })
    }
}

fn is_text_content(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || content_type.contains("html")
        || content_type.contains("xml")
}

/// Storage key of a page within its site
pub fn page_path(url: &Url) -> String {
    url.path().to_string()
}

/// Decides which discovered links may enter a site's frontier
#[derive(Debug, Clone)]
pub struct LinkFilter {
    host: String,
    port: Option<u16>,
    excluded_schemes: HashSet<String>,
    excluded_extensions: HashSet<String>,
}

impl LinkFilter {
    /// Create a filter for the site rooted at `root`
    pub fn new(root: &Url, config: &CrawlConfig) -> Result<Self> {
        let host = root
            .host_str()
            .ok_or_else(|| Error::Config(format!("site url '{}' has no host", root)))?
            .to_string();

        Ok(Self {
            host,
            port: root.port_or_known_default(),
            excluded_schemes: config
                .excluded_schemes
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            excluded_extensions: config
                .excluded_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        })
    }

    /// Parse a link and return it if it belongs to the site and is worth fetching
    pub fn accept(&self, link: &str) -> Option<Url> {
        if link.contains('#') || link.contains('?') {
            return None;
        }

        let url = Url::parse(link).ok()?;
        if self.excluded_schemes.contains(url.scheme()) {
            return None;
        }
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }

        if url.host_str() != Some(self.host.as_str()) || url.port_or_known_default() != self.port
        {
            return None;
        }

        if let Some(ext) = extension(&url) {
            if self.excluded_extensions.contains(&ext) {
                return None;
            }
        }

        Some(url)
    }
}

/// Lower-cased extension of the last path segment
fn extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn filter() -> LinkFilter {
        let root = Url::parse("https://example.com").unwrap();
        LinkFilter::new(&root, &CrawlConfig::default()).unwrap()
    }

    #[test]
    fn test_link_filter_accepts_same_site() {
        let filter = filter();
        let url = filter.accept("https://example.com/docs/intro").unwrap();
        assert_eq!(page_path(&url), "/docs/intro");
        assert!(filter.accept("https://example.com/").is_some());
        assert!(filter.accept("https://example.com/page.html").is_some());
    }

    #[test]
    fn test_link_filter_rejections() {
        let filter = filter();
        assert!(filter.accept("https://example.com/page#section").is_none());
        assert!(filter.accept("https://example.com/page?sort=asc").is_none());
        assert!(filter.accept("mailto:team@example.com").is_none());
        assert!(filter.accept("tel:+100200300").is_none());
        assert!(filter.accept("javascript:void(0)").is_none());
        assert!(filter.accept("https://other.com/docs").is_none());
        assert!(filter.accept("https://sub.example.com/docs").is_none());
        assert!(filter.accept("https://example.com/files/report.PDF").is_none());
        assert!(filter.accept("https://example.com/img/logo.png").is_none());
        assert!(filter.accept("not a url").is_none());
    }

    #[test]
    fn test_extension() {
        let url = Url::parse("https://example.com/a/b.tar.ZIP").unwrap();
        assert_eq!(extension(&url), Some("zip".to_string()));
        let url = Url::parse("https://example.com/a/.hidden").unwrap();
        assert_eq!(extension(&url), None);
        let url = Url::parse("https://example.com/a/").unwrap();
        assert_eq!(extension(&url), None);
    }

    #[tokio::test]
    async fn test_http_fetcher() {
        let mock_server = MockServer::start().await;
        let config = CrawlConfig::default();

        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("referer", config.referrer.as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><body>hi</body></html>".as_bytes(), "text/html"),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/image"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2], "image/png"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new(&config).unwrap();
        let base = Url::parse(&mock_server.uri()).unwrap();

        let page = fetcher.fetch(&base.join("/page").unwrap()).await.unwrap();
        assert_eq!(page.status, 200);
        assert!(page.content.contains("hi"));

        let err = fetcher.fetch(&base.join("/missing").unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));

        let err = fetcher.fetch(&base.join("/image").unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }
}
