//! Index statistics per configured site

use super::Indexer;
use crate::error::Result;
use crate::store::SiteStatus;
use serde::{Deserialize, Serialize};

/// Totals over all configured sites
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalStatistics {
    pub sites: usize,
    pub pages: usize,
    pub lemmas: usize,
    pub indexing: bool,
}

/// Status and size of one configured site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatistics {
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: Option<String>,
    pub error: Option<String>,
    pub pages: usize,
    pub lemmas: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total: TotalStatistics,
    pub detailed: Vec<SiteStatistics>,
}

impl Indexer {
    /// Collect statistics for every configured site
    ///
    /// Sites that have never been scanned are reported as FAILED with zero
    /// pages and lemmas.
    pub async fn statistics(&self) -> Result<Statistics> {
        let mut detailed = Vec::with_capacity(self.config().sites.len());

        for site in &self.config().sites {
            let url = site.normalized_url();
            let entry = match self.store().get_site_by_url(&url).await? {
                Some(record) => {
                    let stats = self.store().get_site_stats(record.id).await?;
                    SiteStatistics {
                        status: record.get_status().unwrap_or(SiteStatus::Failed),
                        status_time: Some(record.status_time),
                        error: record.last_error,
                        pages: stats.page_count,
                        lemmas: stats.lemma_count,
                        url,
                        name: site.name.clone(),
                    }
                }
                None => SiteStatistics {
                    url,
                    name: site.name.clone(),
                    status: SiteStatus::Failed,
                    status_time: None,
                    error: None,
                    pages: 0,
                    lemmas: 0,
                },
            };
            detailed.push(entry);
        }

        let total = TotalStatistics {
            sites: detailed.len(),
            pages: detailed.iter().map(|s| s.pages).sum(),
            lemmas: detailed.iter().map(|s| s.lemmas).sum(),
            indexing: self.is_indexing(),
        };

        Ok(Statistics { total, detailed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, SiteConfig};
    use crate::lemma::{DictionaryMorphology, Language, Lemmatizer};
    use crate::store::IndexStore;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_statistics() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.sites = vec![
            SiteConfig {
                name: "Scanned".to_string(),
                url: "https://scanned.test".to_string(),
            },
            SiteConfig {
                name: "Never".to_string(),
                url: "https://never.test/".to_string(),
            },
        ];

        let store = IndexStore::connect(&config).await.unwrap();
        let site = store.ensure_site("https://scanned.test", "Scanned").await.unwrap();
        let page = store.upsert_page(site.id, "/", 200, "").await.unwrap();
        let counts: HashMap<String, u32> =
            [("cat".to_string(), 2), ("dog".to_string(), 1)].into_iter().collect();
        store.apply_lemmas(page, site.id, &counts).await.unwrap();
        store
            .set_site_status(site.id, SiteStatus::Indexed, None)
            .await
            .unwrap();

        let lemmatizer = Lemmatizer::new(
            Language::English,
            Arc::new(DictionaryMorphology::new(Language::English)),
        )
        .unwrap();
        let indexer = Indexer::new(Arc::new(config), store, lemmatizer).unwrap();

        let stats = indexer.statistics().await.unwrap();
        assert_eq!(stats.total.sites, 2);
        assert_eq!(stats.total.pages, 1);
        assert_eq!(stats.total.lemmas, 2);
        assert!(!stats.total.indexing);

        assert_eq!(stats.detailed[0].status, SiteStatus::Indexed);
        assert!(stats.detailed[0].status_time.is_some());

        let never = &stats.detailed[1];
        assert_eq!(never.url, "https://never.test");
        assert_eq!(never.status, SiteStatus::Failed);
        assert_eq!(never.pages, 0);
        assert!(never.status_time.is_none());
    }
}
