//! Cache-aware page analysis.
//!
//! [`Analyzer`] ties the pieces together: a lookup in the analysis cache,
//! then on a miss a fetch, a synchronous inspection of the markup, link
//! checks through the link cache, and scoring. Only complete reports are
//! cached. Concurrent requests for the same URL are not coalesced; each
//! miss does its own fetch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use seoscope_core::cache::Sweep;
use seoscope_core::{AppConfig, CacheJanitor, Error, LinkCache, StatsStore, TtlCache, fingerprint};
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout_at};
use url::Url;

use crate::fetch::{FetchConfig, Fetcher, HttpFetcher, canonicalize};
use crate::links::{HttpProber, LinkValidator, Prober, ValidatorConfig};
use crate::score::{SeoAnalysis, build_report, inspect_page};

/// Completed reports keyed by URL fingerprint.
pub type AnalysisCache = TtlCache<Arc<SeoAnalysis>>;

/// A report and whether it came from the cache.
#[derive(Debug, Clone)]
pub struct Analyzed {
    pub report: Arc<SeoAnalysis>,
    pub cached: bool,
}

/// Sizes, settings and monthly hit/miss counts for both caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub analysis_entries: usize,
    pub link_entries: usize,
    pub analysis_cache_hits: u64,
    pub analysis_cache_misses: u64,
    pub link_cache_hits: u64,
    pub link_cache_misses: u64,
    pub analysis_cache_ttl_secs: u64,
    pub link_cache_ttl_secs: u64,
    pub max_cache_size: usize,
    pub max_link_cache_size: usize,
}

/// SEO analyzer with result and link caches.
pub struct Analyzer {
    analyses: Arc<AnalysisCache>,
    links: Arc<LinkCache>,
    validator: LinkValidator,
    fetcher: Arc<dyn Fetcher>,
    stats: Arc<StatsStore>,
    janitor: Mutex<Option<CacheJanitor>>,
    analysis_timeout: Duration,
    shut_down: AtomicBool,
}

impl Analyzer {
    /// Build an analyzer with HTTP collaborators.
    ///
    /// Must be called inside a Tokio runtime; the cache janitor starts here.
    pub fn new(config: &AppConfig, stats: Arc<StatsStore>) -> Result<Self, Error> {
        let fetcher = Arc::new(HttpFetcher::new(FetchConfig::from_app(config))?);
        let prober = Arc::new(HttpProber::new(&config.user_agent, config.probe_timeout())?);
        Ok(Self::with_collaborators(config, stats, fetcher, prober))
    }

    /// Build an analyzer around caller-supplied fetch and probe collaborators.
    pub fn with_collaborators(
        config: &AppConfig, stats: Arc<StatsStore>, fetcher: Arc<dyn Fetcher>, prober: Arc<dyn Prober>,
    ) -> Self {
        let analyses = Arc::new(AnalysisCache::new("analysis", config.cache_options()));
        let links = Arc::new(LinkCache::new("links", config.link_cache_options()));
        let validator = LinkValidator::new(links.clone(), prober, stats.clone(), &ValidatorConfig::from_app(config));

        let targets: Vec<Arc<dyn Sweep>> = vec![analyses.clone() as Arc<dyn Sweep>, links.clone() as Arc<dyn Sweep>];
        let janitor = CacheJanitor::spawn(targets, config.sweep_interval());

        Self {
            analyses,
            links,
            validator,
            fetcher,
            stats,
            janitor: Mutex::new(Some(janitor)),
            analysis_timeout: config.analysis_timeout(),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Analyze `url`, serving from cache when a live report exists.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` / `Error::InvalidUrl` for unusable input,
    /// a fetch-stage error when the page cannot be fetched within the analysis
    /// deadline, and `Error::ShutDown` after [`Analyzer::shutdown`]. Failed
    /// analyses are never cached.
    pub async fn analyze(&self, url: &str) -> Result<Analyzed, Error> {
        if self.is_shut_down() {
            return Err(Error::ShutDown);
        }

        self.maybe_sweep().await;

        let deadline = Instant::now() + self.analysis_timeout;
        let canonical = canonicalize(url)?;
        let key = fingerprint(canonical.as_str());

        if let Some(report) = self.analyses.get(&key).await {
            self.stats.increment_stats(1, 0, 0, 0).await;
            tracing::debug!(url = %canonical, "analysis cache hit");
            return Ok(Analyzed { report, cached: true });
        }

        self.stats.increment_stats(0, 1, 0, 0).await;
        tracing::debug!(url = %canonical, "analysis cache miss");

        let report = Arc::new(self.run(&canonical, deadline).await?);
        self.analyses.put(key, report.clone()).await;

        Ok(Analyzed { report, cached: false })
    }

    async fn run(&self, url: &Url, deadline: Instant) -> Result<SeoAnalysis, Error> {
        let started = Instant::now();

        let page = timeout_at(deadline, self.fetcher.fetch(url))
            .await
            .map_err(|_| Error::FetchTimeout(format!("{url}: analysis deadline exceeded")))??;

        if !page.is_markup() {
            return Err(Error::ParseFailed(format!(
                "{url}: unsupported content type {}",
                page.content_type.as_deref().unwrap_or("unknown")
            )));
        }

        let load_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let inspection = inspect_page(&String::from_utf8_lossy(&page.body), &page.final_url);

        let tally = self.validator.check_links(&inspection.links, deadline).await;
        if !tally.is_complete() {
            tracing::debug!(url = %url, checked = tally.checked, total = tally.total(), "link checks cut short");
        }

        let report = build_report(url.as_str(), inspection, page.page_size, load_time_ms, &tally);
        tracing::info!(url = %url, score = report.score, load_time_ms, links = tally.total(), "analysis complete");
        Ok(report)
    }

    async fn maybe_sweep(&self) {
        self.analyses.maybe_sweep().await;
        self.links.maybe_sweep().await;
    }

    /// Whether a live report for `url` is cached. Unusable URLs are never cached.
    pub async fn is_cached(&self, url: &str) -> bool {
        match canonicalize(url) {
            Ok(canonical) => self.analyses.contains(&fingerprint(canonical.as_str())).await,
            Err(_) => false,
        }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        let current = self.stats.current_stats().await;
        CacheStats {
            analysis_entries: self.analyses.len().await,
            link_entries: self.links.len().await,
            analysis_cache_hits: current.analysis_hits,
            analysis_cache_misses: current.analysis_misses,
            link_cache_hits: current.link_hits,
            link_cache_misses: current.link_misses,
            analysis_cache_ttl_secs: self.analyses.ttl().await.as_secs(),
            link_cache_ttl_secs: self.links.ttl().await.as_secs(),
            max_cache_size: self.analyses.max_size().await,
            max_link_cache_size: self.links.max_size().await,
        }
    }

    /// Resize the analysis cache, trimming immediately if it shrank.
    pub async fn set_max_cache_size(&self, size: usize) {
        self.analyses.set_max_size(size).await;
    }

    /// Resize the link cache, trimming immediately if it shrank.
    pub async fn set_max_link_cache_size(&self, size: usize) {
        self.links.set_max_size(size).await;
    }

    pub async fn set_cache_ttl(&self, ttl: Duration) {
        self.analyses.set_ttl(ttl).await;
    }

    pub async fn set_link_cache_ttl(&self, ttl: Duration) {
        self.links.set_ttl(ttl).await;
    }

    /// Drop every cached analysis. Link verdicts are kept.
    pub async fn clear_cache(&self) {
        self.analyses.clear().await;
        tracing::info!("analysis cache cleared");
    }

    /// The statistics store this analyzer records into.
    pub fn stats(&self) -> &Arc<StatsStore> {
        &self.stats
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Stop the janitor, flush and close the statistics store, and empty both
    /// caches. Link probes left running by an earlier deadline no longer write
    /// to the link cache. Later calls return `Ok(())` without doing anything.
    ///
    /// # Errors
    ///
    /// Returns the statistics store's final write error, if any.
    pub async fn shutdown(&self) -> Result<(), Error> {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        if let Some(janitor) = self.janitor.lock().await.take() {
            janitor.shutdown().await;
        }
        self.validator.close();

        let result = self.stats.shutdown().await;
        self.analyses.clear().await;
        self.links.clear().await;

        tracing::info!("analyzer shut down");
        result
    }
}
