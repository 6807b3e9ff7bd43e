//! Periodic cache sweeper.
//!
//! The janitor owns one background task that sweeps every registered cache
//! on a fixed period. It stops on an explicit shutdown signal and is joined,
//! so no sweep is still running once `shutdown` returns.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::ttl::{SweepReport, TtlCache};

/// Something the janitor can sweep.
#[async_trait]
pub trait Sweep: Send + Sync {
    fn label(&self) -> &'static str;

    async fn sweep(&self) -> SweepReport;
}

#[async_trait]
impl<V: Clone + Send + Sync> Sweep for TtlCache<V> {
    fn label(&self) -> &'static str {
        self.name()
    }

    async fn sweep(&self) -> SweepReport {
        TtlCache::sweep(self).await
    }
}

/// Handle to the background sweep task.
pub struct CacheJanitor {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CacheJanitor {
    /// Start sweeping `targets` every `period`. The first sweep runs one period from now.
    pub fn spawn(targets: Vec<Arc<dyn Sweep>>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(janitor_task(targets, period, shutdown_rx));
        Self { shutdown_tx, handle }
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "cache janitor task ended abnormally");
        }
    }
}

async fn janitor_task(targets: Vec<Arc<dyn Sweep>>, period: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(period_secs = period.as_secs(), caches = targets.len(), "cache janitor started");

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                for target in &targets {
                    let report = target.sweep().await;
                    tracing::trace!(
                        cache = target.label(),
                        expired = report.expired,
                        trimmed = report.trimmed,
                        remaining = report.remaining,
                        "periodic sweep"
                    );
                }
            }
        }
    }

    tracing::info!("cache janitor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheOptions;

    fn short_lived(max_size: usize) -> Arc<TtlCache<u32>> {
        Arc::new(TtlCache::new(
            "test",
            CacheOptions { ttl: Duration::from_secs(1), max_size, sweep_interval: Duration::from_secs(5) },
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_janitor_sweeps_on_period() {
        let analyses = short_lived(10);
        let links = short_lived(10);
        analyses.put("a", 1).await;
        links.put("l", 2).await;

        let targets: Vec<Arc<dyn Sweep>> = vec![analyses.clone() as Arc<dyn Sweep>, links.clone() as Arc<dyn Sweep>];
        let janitor = CacheJanitor::spawn(targets, Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(analyses.len().await, 1);

        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        assert_eq!(analyses.len().await, 0);
        assert_eq!(links.len().await, 0);

        janitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_janitor_shutdown_stops_sweeps() {
        let cache = short_lived(10);
        let janitor = CacheJanitor::spawn(vec![cache.clone() as Arc<dyn Sweep>], Duration::from_secs(5));
        janitor.shutdown().await;

        cache.put("a", 1).await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        // Expired but never swept.
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.len().await, 1);
    }
}
