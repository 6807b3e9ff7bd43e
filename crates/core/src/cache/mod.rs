//! In-memory caches for analysis results and link verdicts.
//!
//! Both caches share one implementation:
//!
//! - Fixed-size SHA-256 fingerprints as keys
//! - Lazy TTL expiry on read
//! - Oldest-first capacity trimming on sweep
//! - A janitor task that sweeps on a fixed period

pub mod hash;
pub mod janitor;
pub mod ttl;

pub use hash::fingerprint;
pub use janitor::{CacheJanitor, Sweep};
pub use ttl::{CacheOptions, SweepReport, TtlCache};

/// Cache of link reachability verdicts. Negative outcomes are cached too.
pub type LinkCache = TtlCache<bool>;
