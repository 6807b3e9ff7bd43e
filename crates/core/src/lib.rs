//! Core types and shared functionality for seoscope.
//!
//! This crate provides:
//! - TTL caches for analyses and link verdicts, plus their sweeper task
//! - Monthly site statistics with JSON persistence
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod stats;

pub use cache::{CacheJanitor, CacheOptions, LinkCache, TtlCache, fingerprint};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use stats::{MonthlyStats, StatsOptions, StatsStore};
