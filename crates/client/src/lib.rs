//! Client code for seoscope.
//!
//! This crate provides the page fetch pipeline, link discovery and checking,
//! SEO scoring, and the cache-aware [`Analyzer`] that composes them.

pub mod analyze;
pub mod fetch;
pub mod links;
pub mod score;

pub use analyze::{AnalysisCache, Analyzed, Analyzer, CacheStats};
pub use fetch::{FetchConfig, FetchedPage, Fetcher, HttpFetcher, canonicalize};
pub use links::{HttpProber, LinkCandidate, LinkKind, LinkTally, LinkValidator, Prober, ValidatorConfig};
pub use score::{SeoAnalysis, Severity};
