//! Cached link reachability checks with bounded fan-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use seoscope_core::{AppConfig, Error, LinkCache, StatsStore, fingerprint};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until, timeout_at};

use super::{LinkCandidate, LinkKind};

/// Network check for a single link.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Whether `url` answered. Failures of any kind are `false`.
    async fn probe(&self, url: &str) -> bool;
}

/// `HEAD`-request [`Prober`]; a status in `200..400` counts as reachable.
pub struct HttpProber {
    http: Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build probe client: {e}")))?;
        Ok(Self { http, timeout })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> bool {
        match self.http.head(url).timeout(self.timeout).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::trace!(url, status, "probed link");
                (200..400).contains(&status)
            }
            Err(e) => {
                tracing::trace!(url, error = %e, "link probe failed");
                false
            }
        }
    }
}

/// Fan-out limits for link checking.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Probes in flight at once.
    pub concurrency: usize,
    /// Deadline for checking all links of one page.
    pub link_check_timeout: Duration,
    /// Timeout for one probe.
    pub probe_timeout: Duration,
    pub user_agent: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            link_check_timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(5),
            user_agent: "SEOAnalyzer/1.0".into(),
        }
    }
}

impl ValidatorConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            concurrency: config.probe_concurrency,
            link_check_timeout: config.link_check_timeout(),
            probe_timeout: config.probe_timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Counts for one page's links.
///
/// `internal` and `external` cover every unique candidate; `checked` and
/// `broken` cover only the probes that finished before the deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkTally {
    pub internal: usize,
    pub external: usize,
    pub checked: usize,
    pub broken: usize,
}

impl LinkTally {
    pub fn total(&self) -> usize {
        self.internal + self.external
    }

    /// Whether every candidate got a verdict.
    pub fn is_complete(&self) -> bool {
        self.checked == self.total()
    }
}

#[derive(Default)]
struct Outcomes {
    checked: usize,
    broken: usize,
}

/// Link checker backed by the shared [`LinkCache`].
///
/// Cheap to clone; clones share the cache, prober and stats store.
#[derive(Clone)]
pub struct LinkValidator {
    cache: Arc<LinkCache>,
    prober: Arc<dyn Prober>,
    stats: Arc<StatsStore>,
    concurrency: usize,
    link_check_timeout: Duration,
    closed: Arc<AtomicBool>,
}

impl LinkValidator {
    pub fn new(cache: Arc<LinkCache>, prober: Arc<dyn Prober>, stats: Arc<StatsStore>, config: &ValidatorConfig) -> Self {
        Self {
            cache,
            prober,
            stats,
            concurrency: config.concurrency.max(1),
            link_check_timeout: config.link_check_timeout,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop caching verdicts. Probes still running from a detached fan-out
    /// finish without writing to the cache.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn cache(&self) -> &Arc<LinkCache> {
        &self.cache
    }

    /// Whether `url` is reachable, from cache when possible.
    ///
    /// A miss probes the link and caches the verdict, reachable or not.
    pub async fn validate(&self, url: &str) -> bool {
        let key = fingerprint(url);

        if let Some(accessible) = self.cache.get(&key).await {
            self.stats.increment_stats(0, 0, 1, 0).await;
            tracing::trace!(url, accessible, "link cache hit");
            return accessible;
        }

        self.stats.increment_stats(0, 0, 0, 1).await;
        let accessible = self.prober.probe(url).await;
        if self.is_closed() {
            tracing::trace!(url, accessible, "validator closed, verdict not cached");
            return accessible;
        }
        self.cache.put(key, accessible).await;
        tracing::debug!(url, accessible, "link checked");
        accessible
    }

    /// Check every candidate with bounded parallelism.
    ///
    /// The link deadline is the earlier of `parent_deadline` and now plus the
    /// link-check timeout. Once it passes no further probes are dispatched and
    /// the tally gathered so far is returned; probes still in flight are left
    /// to finish on their own and their results are not counted.
    pub async fn check_links(&self, candidates: &[LinkCandidate], parent_deadline: Instant) -> LinkTally {
        let mut tally = LinkTally::default();
        for candidate in candidates {
            match candidate.kind {
                LinkKind::Internal => tally.internal += 1,
                LinkKind::External => tally.external += 1,
            }
        }
        if candidates.is_empty() {
            return tally;
        }

        let deadline = parent_deadline.min(Instant::now() + self.link_check_timeout);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let outcomes = Arc::new(Mutex::new(Outcomes::default()));
        let mut tasks = JoinSet::new();

        for candidate in candidates {
            let permit = tokio::select! {
                biased;
                () = sleep_until(deadline) => {
                    tracing::debug!(dispatched = tasks.len(), total = candidates.len(), "link deadline hit during dispatch");
                    break;
                }
                acquired = semaphore.clone().acquire_owned() => match acquired {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let validator = self.clone();
            let outcomes = outcomes.clone();
            let url = candidate.url.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let accessible = validator.validate(&url).await;
                let mut outcomes = outcomes.lock().await;
                outcomes.checked += 1;
                if !accessible {
                    outcomes.broken += 1;
                }
            });
        }

        let drained = timeout_at(deadline, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "link check task failed");
                }
            }
        })
        .await;

        if drained.is_err() {
            tracing::debug!(pending = tasks.len(), "link deadline hit, returning partial tally");
            tasks.detach_all();
        }

        let outcomes = outcomes.lock().await;
        tally.checked = outcomes.checked;
        tally.broken = outcomes.broken;
        tally
    }
}
