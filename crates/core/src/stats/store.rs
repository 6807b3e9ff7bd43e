//! Monthly statistics store with background persistence.
//!
//! All months live in one map behind a single `RwLock`. Mutations take the
//! write lock only long enough to bump counters; disk writes happen on a
//! background task that snapshots under the read lock and replaces
//! `stats.json` via a temporary file and rename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, Notify, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::legacy::LegacyStatistics;
use super::month::{current_month, month_key, retained_month_keys};
use super::{MonthlyStats, StatsOptions};
use crate::error::Error;

/// Canonical statistics file inside the data directory.
pub const STATS_FILE: &str = "stats.json";

/// Pre-monthly statistics file, migrated once on startup.
pub const LEGACY_STATS_FILE: &str = "statistics.json";

const RETENTION_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// `last_write_ms` before the first successful write.
const NEVER_WRITTEN: u64 = u64::MAX;

/// Lifecycle of a [`StatsStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StoreState {
    Uninitialized = 0,
    Loading = 1,
    Ready = 2,
    ShuttingDown = 3,
    Closed = 4,
}

impl StoreState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => StoreState::Uninitialized,
            1 => StoreState::Loading,
            2 => StoreState::Ready,
            3 => StoreState::ShuttingDown,
            _ => StoreState::Closed,
        }
    }
}

struct Shared {
    months: RwLock<BTreeMap<String, MonthlyStats>>,
    path: PathBuf,
    legacy_path: PathBuf,
    flush_interval: Duration,
    epoch: Instant,
    /// Milliseconds since `epoch` of the last write or write request.
    last_write_ms: AtomicU64,
    write_requested: Notify,
    /// Serializes saves so two writers never share the temporary file.
    save_lock: Mutex<()>,
    state: AtomicU8,
}

struct Writer {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Monthly counters for cache effectiveness, visitors and analysis traffic.
///
/// Obtain one with [`StatsStore::open`] and stop it with
/// [`StatsStore::shutdown`]; mutations after shutdown are silently dropped.
pub struct StatsStore {
    shared: Arc<Shared>,
    writer: Mutex<Option<Writer>>,
}

impl StatsStore {
    /// Load persisted statistics from `options.data_dir` and start the writer.
    ///
    /// Creates the data directory, merges `stats.json` into memory, folds in a
    /// legacy `statistics.json` if one is present, and writes the result back.
    ///
    /// # Errors
    ///
    /// Returns `Error::StatsIo` if the directory cannot be created or
    /// `stats.json` cannot be read, and `Error::StatsCorrupt` if it does not
    /// parse. Legacy migration and the initial write only log on failure.
    pub async fn open(options: StatsOptions) -> Result<Self, Error> {
        tokio::fs::create_dir_all(&options.data_dir)
            .await
            .map_err(|e| Error::stats_io(format!("creating {}", options.data_dir.display()), e))?;

        let shared = Arc::new(Shared::new(&options));
        shared.set_state(StoreState::Loading);
        shared.ensure_current_month().await;

        match shared.load().await {
            Ok(true) => tracing::info!(path = %shared.path.display(), "loaded statistics"),
            Ok(false) => tracing::info!(path = %shared.path.display(), "no statistics file, starting fresh"),
            Err(e) => {
                tracing::error!(path = %shared.path.display(), error = %e, "failed to load statistics");
                return Err(e);
            }
        }

        match shared.migrate_legacy().await {
            Ok(true) => tracing::info!(path = %shared.legacy_path.display(), "migrated legacy statistics"),
            Ok(false) => {}
            Err(e) => tracing::warn!(
                path = %shared.legacy_path.display(),
                error = %e,
                "legacy statistics not migrated"
            ),
        }

        if let Err(e) = shared.save().await {
            tracing::warn!(error = %e, "initial statistics write failed");
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(writer_task(shared.clone(), options.retain_months, shutdown_rx));
        shared.set_state(StoreState::Ready);

        Ok(Self { shared, writer: Mutex::new(Some(Writer { shutdown_tx, handle })) })
    }

    pub fn state(&self) -> StoreState {
        self.shared.state()
    }

    /// Path of the canonical statistics file.
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Add to the current month's cache counters.
    pub async fn increment_stats(&self, analysis_hits: u64, analysis_misses: u64, link_hits: u64, link_misses: u64) {
        self.mutate(|stats| {
            stats.analysis_hits += analysis_hits;
            stats.analysis_misses += analysis_misses;
            stats.link_hits += link_hits;
            stats.link_misses += link_misses;
        })
        .await;
    }

    /// Record a visitor by client IP. Empty identifiers are ignored.
    pub async fn track_visitor(&self, ip: &str) {
        if ip.is_empty() {
            tracing::warn!("ignoring visitor with empty identifier");
            return;
        }
        let now = Utc::now();
        self.mutate(|stats| {
            stats.unique_visitors.insert(ip.to_string(), now);
        })
        .await;
    }

    /// Record one analysis request and how long it took.
    pub async fn track_analysis(&self, url: &str, load_time_ms: f64, is_error: bool) {
        self.mutate(|stats| {
            stats.analysis_requests += 1;
            *stats.popular_urls.entry(url.to_string()).or_insert(0) += 1;
            stats.total_load_time += load_time_ms;
            stats.total_requests += 1;
            if is_error {
                stats.error_count += 1;
            }
        })
        .await;
    }

    async fn mutate<F>(&self, apply: F)
    where
        F: FnOnce(&mut MonthlyStats),
    {
        if !self.shared.accepts_writes() {
            tracing::trace!(state = ?self.state(), "statistics store closed, dropping update");
            return;
        }

        let now = Utc::now();
        let key = month_key(now);
        {
            let mut months = self.shared.months.write().await;
            let stats = months.entry(key).or_insert_with_key(|key| MonthlyStats::new(key.clone(), now));
            apply(stats);
            stats.last_updated = now;
        }

        self.shared.request_write_if_quiet();
    }

    /// Deep copy of the current month, empty if nothing was recorded yet.
    pub async fn current_stats(&self) -> MonthlyStats {
        let key = current_month();
        let months = self.shared.months.read().await;
        match months.get(&key) {
            Some(stats) => stats.clone(),
            None => MonthlyStats::new(key, Utc::now()),
        }
    }

    /// Deep copy of one month, if present.
    pub async fn monthly_stats(&self, month: &str) -> Option<MonthlyStats> {
        self.shared.months.read().await.get(month).cloned()
    }

    /// Every stored month key, newest first.
    pub async fn all_months(&self) -> Vec<String> {
        self.shared.months.read().await.keys().rev().cloned().collect()
    }

    /// Drop every month older than the current one and the `retain_months`
    /// before it. Returns how many months were removed.
    pub async fn cleanup(&self, retain_months: u32) -> usize {
        if !self.shared.accepts_writes() {
            return 0;
        }
        self.shared.cleanup(retain_months).await
    }

    /// Write the current state to disk now.
    ///
    /// # Errors
    ///
    /// Returns `Error::StatsIo` if the temporary file cannot be written or renamed.
    pub async fn save(&self) -> Result<(), Error> {
        self.shared.save().await
    }

    /// Stop the writer, flush once more, and close the store.
    ///
    /// Calling this again after it has returned is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the error of the final write, if it failed.
    pub async fn shutdown(&self) -> Result<(), Error> {
        let Some(writer) = self.writer.lock().await.take() else {
            return Ok(());
        };

        self.shared.set_state(StoreState::ShuttingDown);
        let _ = writer.shutdown_tx.send(true);
        if let Err(e) = writer.handle.await {
            tracing::warn!(error = %e, "statistics writer did not exit cleanly");
        }

        let result = self.shared.save().await;
        self.shared.set_state(StoreState::Closed);
        tracing::info!("statistics store closed");
        result
    }
}

impl Shared {
    fn new(options: &StatsOptions) -> Self {
        Self {
            months: RwLock::new(BTreeMap::new()),
            path: options.data_dir.join(STATS_FILE),
            legacy_path: options.data_dir.join(LEGACY_STATS_FILE),
            flush_interval: options.flush_interval,
            epoch: Instant::now(),
            last_write_ms: AtomicU64::new(NEVER_WRITTEN),
            write_requested: Notify::new(),
            save_lock: Mutex::new(()),
            state: AtomicU8::new(StoreState::Uninitialized as u8),
        }
    }

    fn state(&self) -> StoreState {
        StoreState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: StoreState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn accepts_writes(&self) -> bool {
        !matches!(self.state(), StoreState::ShuttingDown | StoreState::Closed)
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn mark_written(&self) {
        self.last_write_ms.store(self.elapsed_ms(), Ordering::Release);
    }

    /// Wake the writer if nothing was written for a full flush interval, or
    /// nothing was ever written.
    fn request_write_if_quiet(&self) {
        let now_ms = self.elapsed_ms();
        let last = self.last_write_ms.load(Ordering::Acquire);
        let interval_ms = u64::try_from(self.flush_interval.as_millis()).unwrap_or(u64::MAX);
        if last != NEVER_WRITTEN && now_ms.saturating_sub(last) < interval_ms {
            return;
        }
        if self.last_write_ms.compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire).is_ok() {
            self.write_requested.notify_one();
        }
    }

    async fn ensure_current_month(&self) {
        let now = Utc::now();
        let key = month_key(now);
        self.months.write().await.entry(key).or_insert_with_key(|key| MonthlyStats::new(key.clone(), now));
    }

    /// Merge `stats.json` additively into memory. `Ok(false)` if absent.
    async fn load(&self) -> Result<bool, Error> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(Error::stats_io(format!("reading {}", self.path.display()), e)),
        };

        let loaded: BTreeMap<String, MonthlyStats> = serde_json::from_slice(&data)
            .map_err(|e| Error::StatsCorrupt(format!("{}: {e}", self.path.display())))?;

        let mut months = self.months.write().await;
        for (key, mut stats) in loaded {
            stats.month.clone_from(&key);
            if let Some(existing) = months.remove(&key) {
                stats.absorb(&existing);
            }
            months.insert(key, stats);
        }

        Ok(true)
    }

    /// Fold `statistics.json` into the current month and rename it to `.bak`.
    ///
    /// The fold is applied only after the rename succeeds, so a failed
    /// rename leaves both the file and the in-memory state untouched.
    async fn migrate_legacy(&self) -> Result<bool, Error> {
        let data = match tokio::fs::read(&self.legacy_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(Error::stats_io(format!("reading {}", self.legacy_path.display()), e)),
        };

        let legacy = LegacyStatistics::parse(&data)
            .map_err(|e| Error::StatsCorrupt(format!("{}: {e}", self.legacy_path.display())))?;

        let backup = with_suffix(&self.legacy_path, ".bak");
        tokio::fs::rename(&self.legacy_path, &backup)
            .await
            .map_err(|e| Error::stats_io(format!("renaming {}", self.legacy_path.display()), e))?;

        let now = Utc::now();
        let key = month_key(now);
        let mut months = self.months.write().await;
        let stats = months.entry(key).or_insert_with_key(|key| MonthlyStats::new(key.clone(), now));
        legacy.fold_into(stats, now);

        tracing::debug!(
            backup = %backup.display(),
            last_persisted = ?legacy.last_persisted(),
            "legacy statistics folded into current month"
        );
        Ok(true)
    }

    async fn save(&self) -> Result<(), Error> {
        let _guard = self.save_lock.lock().await;

        let snapshot = self.months.read().await.clone();
        let data =
            serde_json::to_vec_pretty(&snapshot).map_err(|e| Error::stats_io("serializing statistics", e.into()))?;

        let tmp = with_suffix(&self.path, ".tmp");
        if let Err(e) = write_synced(&tmp, &data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::stats_io(format!("writing {}", tmp.display()), e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::stats_io(format!("renaming {}", tmp.display()), e));
        }

        self.mark_written();
        tracing::debug!(path = %self.path.display(), months = snapshot.len(), bytes = data.len(), "statistics saved");
        Ok(())
    }

    async fn persist(&self, trigger: &'static str) {
        if let Err(e) = self.save().await {
            tracing::warn!(trigger, error = %e, "statistics write failed, will retry");
        }
    }

    async fn cleanup(&self, retain_months: u32) -> usize {
        let keep = retained_month_keys(Utc::now(), retain_months);
        let removed = {
            let mut months = self.months.write().await;
            let before = months.len();
            months.retain(|key, _| keep.contains(key));
            before - months.len()
        };

        if removed > 0 {
            tracing::info!(removed, retain_months, "dropped old statistics months");
            self.write_requested.notify_one();
        }
        removed
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

async fn writer_task(shared: Arc<Shared>, retain_months: Option<u32>, mut shutdown_rx: watch::Receiver<bool>) {
    let period = shared.flush_interval;
    let mut flush = interval_at(Instant::now() + period, period);
    flush.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut retention = interval_at(Instant::now() + RETENTION_PERIOD, RETENTION_PERIOD);
    retention.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!(flush_secs = period.as_secs_f64(), ?retain_months, "statistics writer started");

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = shared.write_requested.notified() => shared.persist("requested").await,
            _ = flush.tick() => shared.persist("periodic").await,
            _ = retention.tick(), if retain_months.is_some() => {
                if let Some(months) = retain_months {
                    shared.cleanup(months).await;
                }
            }
        }
    }

    tracing::debug!("statistics writer stopped");
}
