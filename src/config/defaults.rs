//! Default values for configuration

/// Default user agent
pub fn default_crawl_user_agent() -> String {
    format!("sitesearch/{} (Site Indexer)", env!("CARGO_PKG_VERSION"))
}

/// Default referrer sent with every request
pub fn default_crawl_referrer() -> String {
    "https://www.google.com".to_string()
}

/// Default request timeout in seconds
pub fn default_crawl_timeout() -> u64 {
    30
}

/// Default politeness delay between fetches of one site (milliseconds)
pub fn default_crawl_delay_ms() -> u64 {
    500
}

/// Default number of workers sharing one site's frontier
pub fn default_crawl_workers_per_site() -> usize {
    2
}

/// Default number of sites crawled at the same time
pub fn default_crawl_max_concurrent_sites() -> usize {
    4
}

/// Default URL schemes never followed
pub fn default_crawl_excluded_schemes() -> Vec<String> {
    ["tel", "mailto", "file", "javascript", "ftp", "data"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Default file extensions never followed (documents, images, archives)
pub fn default_crawl_excluded_extensions() -> Vec<String> {
    [
        "pdf", "txt", "djv", "djvu", "chm", "doc", "docx", "csv", "xls", "xlsx", "zip", "nc",
        "jpg", "ppt", "fig", "m", "png", "tiff", "bmp", "jpeg", "rar", "7z",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Default number of postings used to seed the candidate set
pub fn default_search_seed_postings_limit() -> usize {
    10
}

/// Default candidate count at or below which narrowing stops
pub fn default_search_narrowing_threshold() -> usize {
    3
}

/// Default number of results per page
pub fn default_search_limit() -> usize {
    20
}

/// Default opening highlight marker
pub fn default_search_highlight_open() -> String {
    "<b>".to_string()
}

/// Default closing highlight marker
pub fn default_search_highlight_close() -> String {
    "</b>".to_string()
}

/// Default HTTP API bind address
pub fn default_server_bind() -> String {
    std::env::var("SITESEARCH_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string())
}
