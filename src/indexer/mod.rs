//! Crawl orchestration
//!
//! An [`Indexer`] owns at most one indexing run at a time. A run spawns one
//! task per configured site (bounded by `crawl.max_concurrent_sites`); each
//! site task rebuilds the site from scratch by walking its pages depth-first
//! with `crawl.workers_per_site` workers sharing one [`Frontier`].

mod frontier;
mod statistics;

pub use frontier::*;
pub use statistics::*;

use crate::config::{Config, SiteConfig};
use crate::crawl::{page_path, Fetcher, HttpFetcher, LinkFilter, PolitenessLimiter};
use crate::error::{Error, Result};
use crate::lemma::Lemmatizer;
use crate::parse::parse_html;
use crate::store::{IndexStore, SiteStatus};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Error recorded on sites that were still indexing when a stop was requested
pub const STOPPED_BY_USER: &str = "Indexing stopped by user";

/// Counters of the current or last run
#[derive(Debug, Default)]
pub struct CrawlProgress {
    pages_indexed: AtomicUsize,
    pages_failed: AtomicUsize,
    sites_finished: AtomicUsize,
}

/// Point-in-time copy of [`CrawlProgress`]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub pages_indexed: usize,
    pub pages_failed: usize,
    pub sites_finished: usize,
}

impl CrawlProgress {
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            pages_indexed: self.pages_indexed.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            sites_finished: self.sites_finished.load(Ordering::Relaxed),
        }
    }
}

/// Result of a single-page rescan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RescanOutcome {
    /// The page was fetched and its lemmas replaced
    Indexed { path: String, lemmas: usize },
    /// The owning site has never been scanned; nothing changed
    SiteNotIndexed,
    /// The page could not be fetched; nothing changed
    FetchFailed { error: String },
}

/// One full indexing run
struct IndexingRun {
    stop: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    progress: Arc<CrawlProgress>,
    handle: Option<JoinHandle<()>>,
}

/// Everything a site task needs, shared across the run's tasks
struct CrawlContext {
    config: Arc<Config>,
    store: IndexStore,
    fetcher: Arc<dyn Fetcher>,
    lemmatizer: Lemmatizer,
    stop: Arc<AtomicBool>,
    progress: Arc<CrawlProgress>,
}

/// Starts, stops and observes indexing runs and single-page rescans
pub struct Indexer {
    config: Arc<Config>,
    store: IndexStore,
    fetcher: Arc<dyn Fetcher>,
    lemmatizer: Lemmatizer,
    run: Mutex<Option<IndexingRun>>,
}

impl Indexer {
    /// Create an indexer fetching over HTTP
    pub fn new(config: Arc<Config>, store: IndexStore, lemmatizer: Lemmatizer) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.crawl)?);
        Ok(Self::with_fetcher(config, store, lemmatizer, fetcher))
    }

    /// Create an indexer over an arbitrary fetcher
    pub fn with_fetcher(
        config: Arc<Config>,
        store: IndexStore,
        lemmatizer: Lemmatizer,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            config,
            store,
            fetcher,
            lemmatizer,
            run: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Whether a run is in progress
    pub fn is_indexing(&self) -> bool {
        self.lock_run()
            .as_ref()
            .is_some_and(|run| run.active.load(Ordering::SeqCst))
    }

    /// Counters of the current or last run
    pub fn progress(&self) -> ProgressSnapshot {
        self.lock_run()
            .as_ref()
            .map(|run| run.progress.snapshot())
            .unwrap_or_default()
    }

    /// Start rebuilding every configured site in the background
    pub fn start(&self) -> Result<()> {
        let mut run = self.lock_run();
        if run
            .as_ref()
            .is_some_and(|r| r.active.load(Ordering::SeqCst))
        {
            return Err(Error::IndexingInProgress);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let active = Arc::new(AtomicBool::new(true));
        let progress = Arc::new(CrawlProgress::default());

        let context = Arc::new(CrawlContext {
            config: self.config.clone(),
            store: self.store.clone(),
            fetcher: self.fetcher.clone(),
            lemmatizer: self.lemmatizer.clone(),
            stop: stop.clone(),
            progress: progress.clone(),
        });

        info!("Starting indexing of {} sites", self.config.sites.len());
        let handle = tokio::spawn(run_all_sites(context, active.clone()));

        *run = Some(IndexingRun {
            stop,
            active,
            progress,
            handle: Some(handle),
        });
        Ok(())
    }

    /// Ask the active run to stop
    ///
    /// Workers observe the request before their next fetch; pages already
    /// stored stay in the index.
    pub fn stop(&self) -> Result<()> {
        let run = self.lock_run();
        match run.as_ref() {
            Some(r) if r.active.load(Ordering::SeqCst) => {
                info!("Stopping indexing");
                r.stop.store(true, Ordering::SeqCst);
                Ok(())
            }
            _ => Err(Error::IndexingNotRunning),
        }
    }

    /// Wait for the current run, if any, to finish
    pub async fn wait(&self) {
        let handle = self.lock_run().as_mut().and_then(|run| run.handle.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Indexing task failed: {}", e);
            }
        }
    }

    /// Re-fetch one page and replace its lemma contribution
    pub async fn rescan_page(&self, url: &str) -> Result<RescanOutcome> {
        let outside = || Error::PageOutsideSites(url.to_string());

        let parsed = Url::parse(url.trim()).map_err(|_| outside())?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(outside());
        }
        let site = self.config.site_for_url(&parsed).ok_or_else(outside)?;

        let Some(record) = self.store.get_site_by_url(&site.normalized_url()).await? else {
            info!("Site {} has not been indexed yet, skipping {}", site.url, url);
            return Ok(RescanOutcome::SiteNotIndexed);
        };

        let page = match self.fetcher.fetch(&parsed).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to fetch {}: {}", parsed, e);
                return Ok(RescanOutcome::FetchFailed {
                    error: e.to_string(),
                });
            }
        };

        let path = page_path(&parsed);
        let page_id = self
            .store
            .upsert_page(record.id, &path, page.status, &page.content)
            .await?;
        let counts = self
            .lemmatizer
            .text_to_lemmas(&parse_html(&page.content, Some(&parsed)).indexable_text());
        self.store
            .replace_page_lemmas(page_id, record.id, &counts)
            .await?;

        info!("Re-indexed {} ({} lemmas)", parsed, counts.len());
        Ok(RescanOutcome::Indexed {
            path,
            lemmas: counts.len(),
        })
    }

    fn lock_run(&self) -> MutexGuard<'_, Option<IndexingRun>> {
        self.run.lock().unwrap_or_else(|e| e.into_inner())
    }
}

async fn run_all_sites(context: Arc<CrawlContext>, active: Arc<AtomicBool>) {
    let permits = Arc::new(Semaphore::new(context.config.crawl.max_concurrent_sites.max(1)));

    // Every site shows INDEXING for the whole run, including those still queued
    let mut queued = Vec::with_capacity(context.config.sites.len());
    for site in &context.config.sites {
        let url = site.normalized_url();
        match context.store.ensure_site(&url, &site.name).await {
            Ok(record) => queued.push((site.clone(), record.id)),
            Err(e) => {
                warn!("Failed to register site {}: {}", url, e);
                context.progress.sites_finished.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    let tasks = queued.into_iter().map(|(site, site_id)| {
        let context = context.clone();
        let permits = permits.clone();
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            if context.stop.load(Ordering::SeqCst) {
                skip_site(&context, &site, site_id).await;
            } else {
                index_site(&context, &site, site_id).await;
            }
            context.progress.sites_finished.fetch_add(1, Ordering::Relaxed);
        })
    });

    for result in join_all(tasks).await {
        if let Err(e) = result {
            warn!("Site task failed: {}", e);
        }
    }

    active.store(false, Ordering::SeqCst);
    let progress = context.progress.snapshot();
    info!(
        "Indexing finished: {} pages indexed, {} failed",
        progress.pages_indexed, progress.pages_failed
    );
}

/// How a site traversal ended
enum SiteOutcome {
    Completed,
    Stopped,
    RootUnavailable(String),
}

/// A site still queued when the run was stopped keeps its previous rows
async fn skip_site(context: &CrawlContext, site: &SiteConfig, site_id: i64) {
    info!("Skipping site {}, indexing was stopped", site.url);
    if let Err(e) = context
        .store
        .set_site_status(site_id, SiteStatus::Failed, Some(STOPPED_BY_USER))
        .await
    {
        warn!("Failed to update status of site {}: {}", site.url, e);
    }
}

async fn index_site(context: &CrawlContext, site: &SiteConfig, site_id: i64) {
    let url = site.normalized_url();
    info!("Indexing site {} ({})", site.name, url);

    let (status, error) = match crawl_site(context, site_id, &url).await {
        Ok(SiteOutcome::Completed) => (SiteStatus::Indexed, None),
        Ok(SiteOutcome::Stopped) => (SiteStatus::Failed, Some(STOPPED_BY_USER.to_string())),
        Ok(SiteOutcome::RootUnavailable(e)) => (SiteStatus::Failed, Some(e)),
        Err(e) => (SiteStatus::Failed, Some(e.to_string())),
    };

    match &error {
        None => info!("Site {} indexed", url),
        Some(e) => warn!("Site {} failed: {}", url, e),
    }

    if let Err(e) = context
        .store
        .set_site_status(site_id, status, error.as_deref())
        .await
    {
        warn!("Failed to update status of site {}: {}", url, e);
    }
}

/// Per-site traversal state shared by the site's workers
struct SiteCrawl<'a> {
    context: &'a CrawlContext,
    site_id: i64,
    root_path: String,
    filter: LinkFilter,
    frontier: Frontier,
    limiter: PolitenessLimiter,
    root_error: Mutex<Option<String>>,
}

async fn crawl_site(context: &CrawlContext, site_id: i64, url: &str) -> Result<SiteOutcome> {
    context.store.delete_site(site_id).await?;

    let root = Url::parse(url)?;
    let crawl = SiteCrawl {
        context,
        site_id,
        root_path: page_path(&root),
        filter: LinkFilter::new(&root, &context.config.crawl)?,
        frontier: Frontier::new(),
        limiter: PolitenessLimiter::from_millis(context.config.crawl.delay_ms),
        root_error: Mutex::new(None),
    };
    crawl.frontier.push(root);

    let workers = context.config.crawl.workers_per_site.max(1);
    let results = join_all((0..workers).map(|_| crawl.worker())).await;
    for result in results {
        result?;
    }

    if context.stop.load(Ordering::SeqCst) {
        return Ok(SiteOutcome::Stopped);
    }
    let root_error = crawl
        .root_error
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .take();
    if let Some(e) = root_error {
        return Ok(SiteOutcome::RootUnavailable(e));
    }
    debug!("Site {} crawled {} paths", url, crawl.frontier.visited_count());
    Ok(SiteOutcome::Completed)
}

impl SiteCrawl<'_> {
    async fn worker(&self) -> Result<()> {
        while let Some(url) = self.frontier.next().await {
            match self.visit(&url).await {
                Ok(links) => self.frontier.complete(links),
                Err(e) => {
                    self.frontier.close();
                    self.frontier.complete(Vec::new());
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Fetch, store and index one page, returning the links to follow
    async fn visit(&self, url: &Url) -> Result<Vec<Url>> {
        self.limiter.wait().await;

        if self.context.stop.load(Ordering::SeqCst) {
            self.frontier.close();
            return Ok(Vec::new());
        }

        let path = page_path(url);
        let page = match self.context.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                self.context
                    .progress
                    .pages_failed
                    .fetch_add(1, Ordering::Relaxed);
                if path == self.root_path {
                    warn!("Failed to fetch site root {}: {}", url, e);
                    *self.root_error.lock().unwrap_or_else(|e| e.into_inner()) =
                        Some(e.to_string());
                } else {
                    debug!("Skipping {}: {}", url, e);
                }
                return Ok(Vec::new());
            }
        };

        let store = &self.context.store;
        let page_id = store
            .upsert_page(self.site_id, &path, page.status, &page.content)
            .await?;

        let parsed = parse_html(&page.content, Some(url));
        let counts = self
            .context
            .lemmatizer
            .text_to_lemmas(&parsed.indexable_text());
        store.apply_lemmas(page_id, self.site_id, &counts).await?;

        self.context
            .progress
            .pages_indexed
            .fetch_add(1, Ordering::Relaxed);
        debug!("Indexed {} ({} lemmas)", url, counts.len());

        Ok(parsed
            .links
            .iter()
            .filter_map(|link| self.filter.accept(link))
            .collect())
    }
}
