//! Ranked retrieval over the lemma index
//!
//! A query is lemmatized like page content. Its lemmas are ordered from the
//! rarest to the most frequent; the rarest one seeds a small candidate set
//! from its best postings, and the following lemmas narrow it by
//! intersection while it is still larger than the narrowing threshold.
//! Candidates are scored by the sum of their ranks for every query lemma and
//! normalized against the best candidate.

mod snippet;

pub use snippet::*;

use crate::config::{normalize_host, SearchConfig};
use crate::error::{Error, Result};
use crate::lemma::Lemmatizer;
use crate::parse::parse_html;
use crate::store::{IndexStore, Page, Site};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Search options
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Restrict results to the site with this root URL
    pub site: Option<String>,
    /// Number of ranked results to skip
    pub offset: usize,
    /// Maximum number of results to return
    pub limit: Option<usize>,
}

/// One ranked page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub site: String,
    pub site_name: String,
    pub uri: String,
    pub title: String,
    pub snippet: String,
    pub relevance: f64,
}

/// A page of results plus the total number of matches
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub count: usize,
    pub results: Vec<SearchResult>,
}

/// Query engine over an [`IndexStore`]
#[derive(Clone)]
pub struct QueryEngine {
    store: IndexStore,
    lemmatizer: Lemmatizer,
    config: SearchConfig,
    highlighter: Highlighter,
}

impl QueryEngine {
    pub fn new(store: IndexStore, lemmatizer: Lemmatizer, config: SearchConfig) -> Self {
        let highlighter = Highlighter::new(&config.highlight_open, &config.highlight_close);
        Self {
            store,
            lemmatizer,
            config,
            highlighter,
        }
    }

    /// Rank pages for a free-text query
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResults> {
        if query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }

        info!("Searching: {}", query);

        let site_id = match &options.site {
            Some(url) => match self.store.get_site_by_url(&normalize_host(url.trim())).await? {
                Some(site) => Some(site.id),
                None => {
                    debug!("Unknown site filter {}", url);
                    return Ok(SearchResults::default());
                }
            },
            None => None,
        };

        let lemmas = self.ordered_lemmas(query, site_id).await?;
        if lemmas.is_empty() {
            debug!("No query lemma is indexed");
            return Ok(SearchResults::default());
        }

        let candidates = self.candidates(&lemmas, site_id).await?;
        debug!("{} candidate pages", candidates.len());

        let ranks = self.store.rank_sums(&candidates, &lemmas).await?;
        let max = ranks.values().copied().max().unwrap_or(0);

        let mut scored: Vec<(i64, f64)> = candidates
            .iter()
            .map(|id| {
                let absolute = ranks.get(id).copied().unwrap_or(0);
                let relevance = if max > 0 {
                    absolute as f64 / max as f64
                } else {
                    0.0
                };
                (*id, relevance)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let count = scored.len();
        let limit = options.limit.unwrap_or(self.config.default_limit);
        let window: Vec<(i64, f64)> = scored.into_iter().skip(options.offset).take(limit).collect();

        let ids: Vec<i64> = window.iter().map(|(id, _)| *id).collect();
        let pages: HashMap<i64, Page> = self
            .store
            .get_pages_by_ids(&ids)
            .await?
            .into_iter()
            .map(|page| (page.id, page))
            .collect();
        let sites: HashMap<i64, Site> = self
            .store
            .list_sites()
            .await?
            .into_iter()
            .map(|site| (site.id, site))
            .collect();

        let results = window
            .into_iter()
            .filter_map(|(id, relevance)| {
                let page = pages.get(&id)?;
                let site = sites.get(&page.site_id)?;
                Some(self.build_result(page, site, query, relevance))
            })
            .collect();

        Ok(SearchResults { count, results })
    }

    /// Indexed query lemmas, rarest first (ties by lemma text)
    async fn ordered_lemmas(&self, query: &str, site_id: Option<i64>) -> Result<Vec<String>> {
        let mut known: Vec<(i64, String)> = Vec::new();
        for lemma in self.lemmatizer.text_to_lemmas(query).into_keys() {
            match self.store.lemma_frequency(&lemma, site_id).await? {
                Some(frequency) if frequency > 0 => known.push((frequency, lemma)),
                _ => debug!("Lemma '{}' is not indexed", lemma),
            }
        }
        known.sort();
        Ok(known.into_iter().map(|(_, lemma)| lemma).collect())
    }

    /// Seed from the rarest lemma, then intersect while the set is still large
    async fn candidates(&self, lemmas: &[String], site_id: Option<i64>) -> Result<Vec<i64>> {
        let Some((rarest, rest)) = lemmas.split_first() else {
            return Ok(Vec::new());
        };

        let mut candidates = self
            .store
            .top_postings(rarest, site_id, self.config.seed_postings_limit)
            .await?;

        for lemma in rest {
            if candidates.len() <= self.config.narrowing_threshold {
                break;
            }
            candidates = self.store.postings_within(lemma, &candidates).await?;
        }

        Ok(candidates)
    }

    fn build_result(&self, page: &Page, site: &Site, query: &str, relevance: f64) -> SearchResult {
        let parsed = parse_html(&page.content, None);
        SearchResult {
            site: site.url.clone(),
            site_name: site.name.clone(),
            uri: page.path.clone(),
            title: parsed.title.unwrap_or_default(),
            snippet: self.highlighter.snippet(&parsed.text, query),
            relevance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lemma::{DictionaryMorphology, Language};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn lemmatizer() -> Lemmatizer {
        let mut morph = DictionaryMorphology::new(Language::English);
        morph
            .parse_entries("cats\tcat\tNOUN\ndogs\tdog\tNOUN\n")
            .unwrap();
        Lemmatizer::new(Language::English, Arc::new(morph)).unwrap()
    }

    struct Fixture {
        store: IndexStore,
        engine: QueryEngine,
        _tmp: TempDir,
    }

    async fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let store = IndexStore::open(&tmp.path().join("index.db")).await.unwrap();
        let engine = QueryEngine::new(store.clone(), lemmatizer(), SearchConfig::default());
        Fixture {
            store,
            engine,
            _tmp: tmp,
        }
    }

    impl Fixture {
        async fn site(&self, url: &str, name: &str) -> i64 {
            self.store.ensure_site(url, name).await.unwrap().id
        }

        async fn page(&self, site_id: i64, path: &str, title: &str, body: &str) -> i64 {
            let html = format!(
                "<html><head><title>{}</title></head><body><p>{}</p></body></html>",
                title, body
            );
            let id = self.store.upsert_page(site_id, path, 200, &html).await.unwrap();
            let counts = lemmatizer().text_to_lemmas(body);
            self.store.apply_lemmas(id, site_id, &counts).await.unwrap();
            id
        }
    }

    #[tokio::test]
    async fn test_relevance_is_normalized() {
        let f = fixture().await;
        let site = f.site("https://example.com", "Example").await;
        f.page(site, "/a", "Page A", "A cat. Another cat. Third cat.").await;
        f.page(site, "/b", "Page B", "One cat with dogs. Dogs bark.").await;

        let found = f.engine.search("cat", &SearchOptions::default()).await.unwrap();
        assert_eq!(found.count, 2);
        assert_eq!(found.results[0].uri, "/a");
        assert_eq!(found.results[0].relevance, 1.0);
        assert_eq!(found.results[1].uri, "/b");
        assert!((found.results[1].relevance - 1.0 / 3.0).abs() < 1e-9);

        let first = &found.results[0];
        assert_eq!(first.title, "Page A");
        assert_eq!(first.site, "https://example.com");
        assert_eq!(first.site_name, "Example");
        assert_eq!(first.snippet, "A <b>cat</b>.");
        assert!(found
            .results
            .iter()
            .all(|r| (0.0..=1.0).contains(&r.relevance)));
    }

    #[tokio::test]
    async fn test_multi_lemma_query_starts_from_rarest() {
        let f = fixture().await;
        let site = f.site("https://example.com", "Example").await;
        f.page(site, "/a", "A", "cat cat cat").await;
        f.page(site, "/b", "B", "cat dogs dogs").await;

        // "dog" is rarer, so only pages with a dog are candidates
        let found = f.engine.search("cats dogs", &SearchOptions::default()).await.unwrap();
        assert_eq!(found.count, 1);
        assert_eq!(found.results[0].uri, "/b");
        assert_eq!(found.results[0].relevance, 1.0);
    }

    #[tokio::test]
    async fn test_narrowing_only_above_threshold() {
        let f = fixture().await;
        let site = f.site("https://example.com", "Example").await;
        for n in 0..5 {
            let body = if n < 2 {
                "fish bird bird bird bird bird"
            } else {
                "fish"
            };
            f.page(site, &format!("/p{}", n), "P", body).await;
        }

        // fish (5) seeds five candidates, more than the threshold, so bird narrows them
        let found = f.engine.search("fish bird", &SearchOptions::default()).await.unwrap();
        assert_eq!(found.count, 2);
        assert!(found.results.iter().all(|r| r.relevance == 1.0));

        // Three candidates are not narrowed any further
        let f = fixture().await;
        let site = f.site("https://example.com", "Example").await;
        f.page(site, "/x", "X", "owl").await;
        f.page(site, "/y", "Y", "owl").await;
        f.page(site, "/z", "Z", "owl crow crow crow crow").await;
        f.page(site, "/w", "W", "crow crow").await;
        let found = f.engine.search("owl crow", &SearchOptions::default()).await.unwrap();
        assert_eq!(found.count, 3);
        assert_eq!(found.results[0].uri, "/z");
        assert!((found.results[1].relevance - 0.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_and_unmatched_queries() {
        let f = fixture().await;
        let site = f.site("https://example.com", "Example").await;
        f.page(site, "/a", "A", "cat").await;

        assert!(matches!(
            f.engine.search("   ", &SearchOptions::default()).await,
            Err(Error::EmptyQuery)
        ));

        let found = f.engine.search("and", &SearchOptions::default()).await.unwrap();
        assert_eq!(found.count, 0);
        assert!(found.results.is_empty());

        let found = f.engine.search("zebra", &SearchOptions::default()).await.unwrap();
        assert_eq!(found.count, 0);
    }

    #[tokio::test]
    async fn test_site_filter() {
        let f = fixture().await;
        let one = f.site("https://one.example", "One").await;
        let two = f.site("https://two.example", "Two").await;
        f.page(one, "/", "One", "cat").await;
        f.page(two, "/", "Two", "cat cat").await;

        let options = SearchOptions {
            site: Some("https://one.example/".to_string()),
            ..Default::default()
        };
        let found = f.engine.search("cat", &options).await.unwrap();
        assert_eq!(found.count, 1);
        assert_eq!(found.results[0].site_name, "One");
        assert_eq!(found.results[0].relevance, 1.0);

        let options = SearchOptions {
            site: Some("https://unknown.example".to_string()),
            ..Default::default()
        };
        let found = f.engine.search("cat", &options).await.unwrap();
        assert_eq!(found.count, 0);
    }

    #[tokio::test]
    async fn test_pagination() {
        let f = fixture().await;
        let site = f.site("https://example.com", "Example").await;
        for n in 1..=5 {
            f.page(site, &format!("/p{}", n), "P", &"cat ".repeat(n)).await;
        }

        let options = SearchOptions {
            offset: 1,
            limit: Some(2),
            ..Default::default()
        };
        let found = f.engine.search("cat", &options).await.unwrap();
        assert_eq!(found.count, 5);
        let uris: Vec<&str> = found.results.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["/p4", "/p3"]);

        let options = SearchOptions {
            offset: 10,
            ..Default::default()
        };
        let found = f.engine.search("cat", &options).await.unwrap();
        assert_eq!(found.count, 5);
        assert!(found.results.is_empty());
    }
}
