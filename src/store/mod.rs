//! Index storage using SQLite
//!
//! This module owns the durable state of the search engine:
//! - Sites (configured hosts and their indexing status)
//! - Pages (fetched documents keyed by path)
//! - Lemmas (site-scoped normal forms with cumulative frequency)
//! - Index rows (per-page rank of each lemma)
//!
//! Page writes go straight to the pool. Lemma and index writes go through a
//! store-wide lock and one transaction per call, so concurrent crawl workers
//! never interleave their frequency updates.

mod schema;

pub use schema::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lemma::LemmaCounts;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Site indexing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteStatus {
    Indexing,
    Indexed,
    Failed,
}

impl std::fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiteStatus::Indexing => write!(f, "INDEXING"),
            SiteStatus::Indexed => write!(f, "INDEXED"),
            SiteStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for SiteStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "INDEXING" => Ok(SiteStatus::Indexing),
            "INDEXED" => Ok(SiteStatus::Indexed),
            "FAILED" => Ok(SiteStatus::Failed),
            _ => Err(Error::Other(format!("Unknown site status: {}", s))),
        }
    }
}

/// A site row
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: String,
    pub status_time: String,
    pub last_error: Option<String>,
}

impl Site {
    pub fn get_status(&self) -> Result<SiteStatus> {
        self.status.parse()
    }
}

/// A stored page
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub site_id: i64,
    pub path: String,
    pub code: i64,
    pub content: String,
}

/// A site-scoped lemma
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lemma {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    pub frequency: i64,
}

/// Page and lemma counts for one site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteStats {
    pub page_count: usize,
    pub lemma_count: usize,
}

/// Totals over every stored site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalStats {
    pub site_count: usize,
    pub page_count: usize,
    pub lemma_count: usize,
}

/// Index database handle
#[derive(Clone)]
pub struct IndexStore {
    pool: SqlitePool,
    lemma_lock: Arc<Mutex<()>>,
}

impl IndexStore {
    /// Connect to the index database configured in `config`, creating the schema if needed
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(&config.paths.db_file).await
    }

    /// Open a database at an explicit path, creating the schema if needed
    pub async fn open(db_path: &Path) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            lemma_lock: Arc::new(Mutex::new(())),
        };

        if !store.is_initialized().await? {
            store.init_schema().await?;
        }

        Ok(store)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='sites'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    // ===== Site Operations =====

    /// Find or create the site row for `url` and mark it INDEXING
    pub async fn ensure_site(&self, url: &str, name: &str) -> Result<Site> {
        let site = sqlx::query_as::<_, Site>(
            r#"
            INSERT INTO sites (url, name, status, status_time, last_error)
            VALUES (?, ?, ?, ?, NULL)
            ON CONFLICT(url) DO UPDATE SET
                name = excluded.name,
                status = excluded.status,
                status_time = excluded.status_time,
                last_error = NULL
            RETURNING id, url, name, status, status_time, last_error
            "#,
        )
        .bind(url)
        .bind(name)
        .bind(SiteStatus::Indexing.to_string())
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(site)
    }

    /// Record a status transition with a fresh timestamp
    pub async fn set_site_status(
        &self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> Result<()> {
        sqlx::query("UPDATE sites SET status = ?, status_time = ?, last_error = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(Utc::now().to_rfc3339())
            .bind(last_error)
            .bind(site_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Get site by normalized URL
    pub async fn get_site_by_url(&self, url: &str) -> Result<Option<Site>> {
        let site = sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(site)
    }

    /// List all sites
    pub async fn list_sites(&self) -> Result<Vec<Site>> {
        let sites = sqlx::query_as::<_, Site>("SELECT * FROM sites ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(sites)
    }

    /// Remove a site's index rows, then its pages, then its lemmas
    ///
    /// The site row itself is kept so its status survives the rebuild.
    pub async fn delete_site(&self, site_id: i64) -> Result<()> {
        let _guard = self.lemma_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM search_index WHERE page_id IN (SELECT id FROM pages WHERE site_id = ?)",
        )
        .bind(site_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM pages WHERE site_id = ?")
            .bind(site_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM lemmas WHERE site_id = ?")
            .bind(site_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!("Cleared stored pages and lemmas of site {}", site_id);
        Ok(())
    }

    // ===== Page Operations =====

    /// Insert or replace a page, returning its id
    pub async fn upsert_page(
        &self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO pages (site_id, path, code, content)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(site_id, path) DO UPDATE SET
                code = excluded.code,
                content = excluded.content
            RETURNING id
            "#,
        )
        .bind(site_id)
        .bind(path)
        .bind(code as i64)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// List the paths stored for a site
    pub async fn list_page_paths(&self, site_id: i64) -> Result<Vec<String>> {
        let paths: Vec<String> =
            sqlx::query_scalar("SELECT path FROM pages WHERE site_id = ? ORDER BY path")
                .bind(site_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(paths)
    }

    /// Load pages by id; missing ids are skipped
    pub async fn get_pages_by_ids(&self, ids: &[i64]) -> Result<Vec<Page>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT * FROM pages WHERE id IN ({})", placeholders(ids.len()));
        let mut query_builder = sqlx::query_as::<_, Page>(&query);
        for id in ids {
            query_builder = query_builder.bind(*id);
        }
        Ok(query_builder.fetch_all(&self.pool).await?)
    }

    // ===== Lemma / Index Operations =====

    /// Add a page's lemma counts to the site's lemmas and set the page's ranks
    pub async fn apply_lemmas(&self, page_id: i64, site_id: i64, counts: &LemmaCounts) -> Result<()> {
        if counts.is_empty() {
            return Ok(());
        }

        let _guard = self.lemma_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        apply_counts(&mut *tx, page_id, site_id, counts).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Replace a page's lemma contribution after a rescan
    ///
    /// The old ranks are subtracted from the site's frequencies, the page's
    /// index rows are removed, lemmas left at zero are deleted and the new
    /// counts are applied, all in one transaction.
    pub async fn replace_page_lemmas(
        &self,
        page_id: i64,
        site_id: i64,
        counts: &LemmaCounts,
    ) -> Result<()> {
        let _guard = self.lemma_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE lemmas SET frequency = frequency - (
                SELECT i.rank FROM search_index i
                WHERE i.page_id = ? AND i.lemma_id = lemmas.id
            )
            WHERE id IN (SELECT lemma_id FROM search_index WHERE page_id = ?)
            "#,
        )
        .bind(page_id)
        .bind(page_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM search_index WHERE page_id = ?")
            .bind(page_id)
            .execute(&mut *tx)
            .await?;

        let dropped = sqlx::query(
            r#"
            DELETE FROM lemmas
            WHERE site_id = ? AND frequency <= 0
              AND id NOT IN (SELECT lemma_id FROM search_index)
            "#,
        )
        .bind(site_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        apply_counts(&mut *tx, page_id, site_id, counts).await?;
        tx.commit().await?;

        debug!(
            "Re-indexed page {} with {} lemmas ({} lemmas dropped)",
            page_id,
            counts.len(),
            dropped
        );
        Ok(())
    }

    /// Get a site's lemma row
    pub async fn get_lemma(&self, site_id: i64, lemma: &str) -> Result<Option<Lemma>> {
        let row = sqlx::query_as::<_, Lemma>("SELECT * FROM lemmas WHERE site_id = ? AND lemma = ?")
            .bind(site_id)
            .bind(lemma)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Lemma → rank for every index row of a page
    pub async fn page_ranks(&self, page_id: i64) -> Result<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT l.lemma, i.rank FROM search_index i
            JOIN lemmas l ON i.lemma_id = l.id
            WHERE i.page_id = ?
            "#,
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Stored frequency of a lemma: the site's row, or the sum over all sites
    pub async fn lemma_frequency(&self, lemma: &str, site_id: Option<i64>) -> Result<Option<i64>> {
        let frequency: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(frequency) FROM lemmas
            WHERE lemma = ? AND (? IS NULL OR site_id = ?)
            "#,
        )
        .bind(lemma)
        .bind(site_id)
        .bind(site_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(frequency)
    }

    /// Pages with the highest rank for a lemma, best first
    pub async fn top_postings(
        &self,
        lemma: &str,
        site_id: Option<i64>,
        limit: usize,
    ) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT i.page_id FROM search_index i
            JOIN lemmas l ON i.lemma_id = l.id
            WHERE l.lemma = ? AND (? IS NULL OR l.site_id = ?)
            ORDER BY i.rank DESC, i.page_id
            LIMIT ?
            "#,
        )
        .bind(lemma)
        .bind(site_id)
        .bind(site_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Subset of `candidates` that contain `lemma`
    pub async fn postings_within(&self, lemma: &str, candidates: &[i64]) -> Result<Vec<i64>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            r#"
            SELECT i.page_id FROM search_index i
            JOIN lemmas l ON i.lemma_id = l.id
            WHERE l.lemma = ? AND i.page_id IN ({})
            ORDER BY i.page_id
            "#,
            placeholders(candidates.len())
        );
        let mut query_builder = sqlx::query_scalar::<_, i64>(&query).bind(lemma);
        for id in candidates {
            query_builder = query_builder.bind(*id);
        }
        Ok(query_builder.fetch_all(&self.pool).await?)
    }

    /// Sum of the ranks of `lemmas` on each of `page_ids`
    pub async fn rank_sums(&self, page_ids: &[i64], lemmas: &[String]) -> Result<HashMap<i64, i64>> {
        if page_ids.is_empty() || lemmas.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            r#"
            SELECT i.page_id, SUM(i.rank) FROM search_index i
            JOIN lemmas l ON i.lemma_id = l.id
            WHERE i.page_id IN ({}) AND l.lemma IN ({})
            GROUP BY i.page_id
            "#,
            placeholders(page_ids.len()),
            placeholders(lemmas.len())
        );
        let mut query_builder = sqlx::query_as::<_, (i64, i64)>(&query);
        for id in page_ids {
            query_builder = query_builder.bind(*id);
        }
        for lemma in lemmas {
            query_builder = query_builder.bind(lemma);
        }
        let rows = query_builder.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }

    // ===== Statistics =====

    /// Get site statistics
    pub async fn get_site_stats(&self, site_id: i64) -> Result<SiteStats> {
        let page_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pages WHERE site_id = ?")
            .bind(site_id)
            .fetch_one(&self.pool)
            .await?;

        let lemma_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM lemmas WHERE site_id = ?")
                .bind(site_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(SiteStats {
            page_count: page_count as usize,
            lemma_count: lemma_count as usize,
        })
    }

    /// Get global statistics
    pub async fn get_global_stats(&self) -> Result<GlobalStats> {
        let site_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sites")
            .fetch_one(&self.pool)
            .await?;

        let page_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pages")
            .fetch_one(&self.pool)
            .await?;

        let lemma_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lemmas")
            .fetch_one(&self.pool)
            .await?;

        Ok(GlobalStats {
            site_count: site_count as usize,
            page_count: page_count as usize,
            lemma_count: lemma_count as usize,
        })
    }
}

/// Upsert lemma rows and index rows for one page on an open transaction
async fn apply_counts(
    conn: &mut SqliteConnection,
    page_id: i64,
    site_id: i64,
    counts: &LemmaCounts,
) -> Result<()> {
    let mut entries: Vec<(&String, &u32)> = counts.iter().collect();
    entries.sort();

    for (lemma, count) in entries {
        let count = *count as i64;
        let lemma_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO lemmas (site_id, lemma, frequency)
            VALUES (?, ?, ?)
            ON CONFLICT(site_id, lemma) DO UPDATE SET
                frequency = frequency + excluded.frequency
            RETURNING id
            "#,
        )
        .bind(site_id)
        .bind(lemma)
        .bind(count)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO search_index (page_id, lemma_id, rank)
            VALUES (?, ?, ?)
            ON CONFLICT(page_id, lemma_id) DO UPDATE SET
                rank = excluded.rank
            "#,
        )
        .bind(page_id)
        .bind(lemma_id)
        .bind(count)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_test_db() -> (IndexStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.db_file = tmp.path().join("test.db");

        let store = IndexStore::connect(&config).await.unwrap();
        (store, tmp)
    }

    fn counts(pairs: &[(&str, u32)]) -> LemmaCounts {
        pairs.iter().map(|(l, c)| (l.to_string(), *c)).collect()
    }

    #[tokio::test]
    async fn test_site_lifecycle() {
        let (store, _tmp) = setup_test_db().await;

        let site = store.ensure_site("https://example.com", "Example").await.unwrap();
        assert_eq!(site.get_status().unwrap(), SiteStatus::Indexing);
        assert!(site.last_error.is_none());

        store
            .set_site_status(site.id, SiteStatus::Failed, Some("boom"))
            .await
            .unwrap();
        let loaded = store.get_site_by_url("https://example.com").await.unwrap().unwrap();
        assert_eq!(loaded.get_status().unwrap(), SiteStatus::Failed);
        assert_eq!(loaded.last_error.as_deref(), Some("boom"));

        // Reused on the next scan, error cleared
        let again = store.ensure_site("https://example.com", "Renamed").await.unwrap();
        assert_eq!(again.id, site.id);
        assert_eq!(again.name, "Renamed");
        assert!(again.last_error.is_none());
        assert_eq!(store.list_sites().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_page_upsert() {
        let (store, _tmp) = setup_test_db().await;
        let site = store.ensure_site("https://example.com", "Example").await.unwrap();

        let first = store.upsert_page(site.id, "/a", 200, "old").await.unwrap();
        let second = store.upsert_page(site.id, "/a", 404, "new").await.unwrap();
        assert_eq!(first, second);

        let page = store.get_pages_by_ids(&[first]).await.unwrap().remove(0);
        assert_eq!(page.code, 404);
        assert_eq!(page.content, "new");

        let other = store.upsert_page(site.id, "/b", 200, "b").await.unwrap();
        let pages = store.get_pages_by_ids(&[first, other, 9999]).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(store.list_page_paths(site.id).await.unwrap(), vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn test_apply_lemmas_overwrites_rank() {
        let (store, _tmp) = setup_test_db().await;
        let site = store.ensure_site("https://example.com", "Example").await.unwrap();
        let page = store.upsert_page(site.id, "/", 200, "").await.unwrap();

        store
            .apply_lemmas(page, site.id, &counts(&[("cat", 3), ("dog", 1)]))
            .await
            .unwrap();
        store
            .apply_lemmas(page, site.id, &counts(&[("cat", 2)]))
            .await
            .unwrap();

        let ranks = store.page_ranks(page).await.unwrap();
        assert_eq!(ranks.get("cat"), Some(&2));
        assert_eq!(ranks.get("dog"), Some(&1));

        // Frequency is cumulative across applications
        let cat = store.get_lemma(site.id, "cat").await.unwrap().unwrap();
        assert_eq!(cat.frequency, 5);
    }

    #[tokio::test]
    async fn test_concurrent_apply_on_disjoint_pages() {
        let (store, _tmp) = setup_test_db().await;
        let site = store.ensure_site("https://example.com", "Example").await.unwrap();

        let mut handles = Vec::new();
        for n in 1..=8u32 {
            let store = store.clone();
            let site_id = site.id;
            handles.push(tokio::spawn(async move {
                let page = store
                    .upsert_page(site_id, &format!("/p{}", n), 200, "")
                    .await
                    .unwrap();
                store
                    .apply_lemmas(page, site_id, &counts(&[("cat", n), ("shared", 1)]))
                    .await
                    .unwrap();
                (page, n)
            }));
        }

        for handle in handles {
            let (page, n) = handle.await.unwrap();
            let ranks = store.page_ranks(page).await.unwrap();
            assert_eq!(ranks.get("cat"), Some(&(n as i64)));
            assert_eq!(ranks.get("shared"), Some(&1));
        }

        let cat = store.get_lemma(site.id, "cat").await.unwrap().unwrap();
        assert_eq!(cat.frequency, (1..=8).sum::<i64>());
        let shared = store.get_lemma(site.id, "shared").await.unwrap().unwrap();
        assert_eq!(shared.frequency, 8);
        assert_eq!(store.get_site_stats(site.id).await.unwrap().lemma_count, 2);
    }

    #[tokio::test]
    async fn test_replace_page_lemmas_retracts_old_counts() {
        let (store, _tmp) = setup_test_db().await;
        let site = store.ensure_site("https://example.com", "Example").await.unwrap();
        let a = store.upsert_page(site.id, "/a", 200, "").await.unwrap();
        let b = store.upsert_page(site.id, "/b", 200, "").await.unwrap();

        store
            .apply_lemmas(a, site.id, &counts(&[("cat", 3), ("old", 2)]))
            .await
            .unwrap();
        store
            .apply_lemmas(b, site.id, &counts(&[("cat", 1)]))
            .await
            .unwrap();

        store
            .replace_page_lemmas(a, site.id, &counts(&[("cat", 1), ("new", 4)]))
            .await
            .unwrap();

        assert!(store.get_lemma(site.id, "old").await.unwrap().is_none());
        assert_eq!(store.get_lemma(site.id, "cat").await.unwrap().unwrap().frequency, 2);
        assert_eq!(store.get_lemma(site.id, "new").await.unwrap().unwrap().frequency, 4);

        let ranks = store.page_ranks(a).await.unwrap();
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks.get("new"), Some(&4));
        assert_eq!(store.page_ranks(b).await.unwrap().get("cat"), Some(&1));
    }

    #[tokio::test]
    async fn test_delete_site_keeps_other_sites() {
        let (store, _tmp) = setup_test_db().await;
        let one = store.ensure_site("https://one.example", "One").await.unwrap();
        let two = store.ensure_site("https://two.example", "Two").await.unwrap();

        let p1 = store.upsert_page(one.id, "/", 200, "").await.unwrap();
        let p2 = store.upsert_page(two.id, "/", 200, "").await.unwrap();
        store.apply_lemmas(p1, one.id, &counts(&[("cat", 1)])).await.unwrap();
        store.apply_lemmas(p2, two.id, &counts(&[("cat", 2)])).await.unwrap();

        store.delete_site(one.id).await.unwrap();

        let stats = store.get_site_stats(one.id).await.unwrap();
        assert_eq!(stats.page_count, 0);
        assert_eq!(stats.lemma_count, 0);
        assert!(store.page_ranks(p1).await.unwrap().is_empty());
        assert!(store.get_site_by_url("https://one.example").await.unwrap().is_some());

        assert_eq!(store.lemma_frequency("cat", None).await.unwrap(), Some(2));
        let global = store.get_global_stats().await.unwrap();
        assert_eq!(global.site_count, 2);
        assert_eq!(global.page_count, 1);
        assert_eq!(global.lemma_count, 1);
    }

    #[tokio::test]
    async fn test_postings_queries() {
        let (store, _tmp) = setup_test_db().await;
        let one = store.ensure_site("https://one.example", "One").await.unwrap();
        let two = store.ensure_site("https://two.example", "Two").await.unwrap();

        let a = store.upsert_page(one.id, "/a", 200, "").await.unwrap();
        let b = store.upsert_page(one.id, "/b", 200, "").await.unwrap();
        let c = store.upsert_page(two.id, "/c", 200, "").await.unwrap();
        store
            .apply_lemmas(a, one.id, &counts(&[("cat", 3)]))
            .await
            .unwrap();
        store
            .apply_lemmas(b, one.id, &counts(&[("cat", 1), ("dog", 2)]))
            .await
            .unwrap();
        store
            .apply_lemmas(c, two.id, &counts(&[("cat", 5)]))
            .await
            .unwrap();

        assert_eq!(store.lemma_frequency("cat", None).await.unwrap(), Some(9));
        assert_eq!(store.lemma_frequency("cat", Some(one.id)).await.unwrap(), Some(4));
        assert_eq!(store.lemma_frequency("bird", None).await.unwrap(), None);

        assert_eq!(store.top_postings("cat", None, 10).await.unwrap(), vec![c, a, b]);
        assert_eq!(store.top_postings("cat", Some(one.id), 1).await.unwrap(), vec![a]);

        assert_eq!(store.postings_within("dog", &[a, b, c]).await.unwrap(), vec![b]);
        assert!(store.postings_within("dog", &[]).await.unwrap().is_empty());

        let sums = store
            .rank_sums(&[a, b], &["cat".to_string(), "dog".to_string()])
            .await
            .unwrap();
        assert_eq!(sums.get(&a), Some(&3));
        assert_eq!(sums.get(&b), Some(&3));
    }
}
