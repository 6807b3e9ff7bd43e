//! TTL-bounded, size-bounded in-memory cache.
//!
//! Entries are stamped with their insertion time and replaced wholesale on
//! every `put`. Reads apply the TTL lazily, so an expired entry is never
//! returned even while it is still physically present. Sweeps remove every
//! expired entry and then trim strictly oldest-first until the cache fits.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// Tuning knobs for a [`TtlCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Age at which an entry stops being served.
    pub ttl: Duration,
    /// Maximum number of entries kept after a sweep.
    pub max_size: usize,
    /// Elapsed time after which an operation may trigger an opportunistic sweep.
    pub sweep_interval: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { ttl: Duration::from_secs(30 * 60), max_size: 1_000, sweep_interval: Duration::from_secs(5 * 60) }
    }
}

/// Outcome of a single sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries removed because their age reached the TTL.
    pub expired: usize,
    /// Entries removed by the oldest-first capacity trim.
    pub trimmed: usize,
    /// Entries left after the sweep.
    pub remaining: usize,
}

impl SweepReport {
    pub fn removed(&self) -> usize {
        self.expired + self.trimmed
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    seq: u64,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    ttl: Duration,
    max_size: usize,
    next_seq: u64,
    last_sweep: Instant,
}

impl<V> Inner<V> {
    fn is_live(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) < self.ttl
    }

    fn sweep(&mut self, now: Instant) -> SweepReport {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < ttl);
        let expired = before - self.entries.len();

        let mut trimmed = 0;
        if self.entries.len() > self.max_size {
            let mut by_age: Vec<(Instant, u64, String)> = self
                .entries
                .iter()
                .map(|(key, entry)| (entry.inserted_at, entry.seq, key.clone()))
                .collect();
            by_age.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

            let excess = self.entries.len() - self.max_size;
            for (_, _, key) in by_age.into_iter().take(excess) {
                self.entries.remove(&key);
                trimmed += 1;
            }
        }

        self.last_sweep = now;
        SweepReport { expired, trimmed, remaining: self.entries.len() }
    }
}

/// Concurrent cache keyed by URL fingerprint.
///
/// One coarse read/write lock guards the whole map. No lock is held across
/// anything but map operations.
pub struct TtlCache<V> {
    name: &'static str,
    sweep_interval: Duration,
    inner: RwLock<Inner<V>>,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    /// Create an empty cache. `name` only appears in logs.
    pub fn new(name: &'static str, options: CacheOptions) -> Self {
        Self {
            name,
            sweep_interval: options.sweep_interval,
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                ttl: options.ttl,
                max_size: options.max_size,
                next_seq: 0,
                last_sweep: Instant::now(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a live entry. Entries whose age reached the TTL read as absent.
    pub async fn get(&self, key: &str) -> Option<V> {
        let inner = self.inner.read().await;
        let now = Instant::now();
        inner
            .entries
            .get(key)
            .filter(|entry| inner.is_live(entry, now))
            .map(|entry| entry.value.clone())
    }

    /// Whether a live entry exists for `key`.
    pub async fn contains(&self, key: &str) -> bool {
        let inner = self.inner.read().await;
        let now = Instant::now();
        inner.entries.get(key).is_some_and(|entry| inner.is_live(entry, now))
    }

    /// Store `value` stamped with the current time, replacing any existing entry.
    ///
    /// Going over capacity sweeps immediately, under the same lock.
    pub async fn put(&self, key: impl Into<String>, value: V) {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(key.into(), Entry { value, inserted_at: now, seq });

        if inner.entries.len() > inner.max_size {
            let report = inner.sweep(now);
            tracing::debug!(
                cache = self.name,
                expired = report.expired,
                trimmed = report.trimmed,
                remaining = report.remaining,
                "capacity sweep"
            );
        }
    }

    /// Remove expired entries, then trim oldest-first down to the maximum size.
    pub async fn sweep(&self) -> SweepReport {
        let report = self.inner.write().await.sweep(Instant::now());
        if report.removed() > 0 {
            tracing::info!(
                cache = self.name,
                expired = report.expired,
                trimmed = report.trimmed,
                remaining = report.remaining,
                "cache sweep"
            );
        }
        report
    }

    /// Sweep only if the sweep interval has elapsed since the last sweep.
    pub async fn maybe_sweep(&self) -> Option<SweepReport> {
        let due = self.inner.read().await.last_sweep.elapsed() >= self.sweep_interval;
        if due { Some(self.sweep().await) } else { None }
    }

    pub async fn set_ttl(&self, ttl: Duration) {
        self.inner.write().await.ttl = ttl;
    }

    /// Change the capacity and trim right away if the cache no longer fits.
    pub async fn set_max_size(&self, max_size: usize) {
        let mut inner = self.inner.write().await;
        inner.max_size = max_size;
        if inner.entries.len() > max_size {
            let report = inner.sweep(Instant::now());
            tracing::info!(cache = self.name, max_size, trimmed = report.trimmed, "cache resized");
        }
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        let dropped = inner.entries.len();
        inner.entries.clear();
        tracing::debug!(cache = self.name, dropped, "cache cleared");
    }

    /// Number of physically present entries, expired or not.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    pub async fn ttl(&self) -> Duration {
        self.inner.read().await.ttl
    }

    pub async fn max_size(&self) -> usize {
        self.inner.read().await.max_size
    }
}
