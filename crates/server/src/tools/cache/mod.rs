//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting, tuning and clearing the
//! in-memory analysis and link caches.

pub mod clear;
pub mod status;
pub mod tune;

pub use clear::clear_impl;
pub use status::{CacheStatusParams, status_impl};
pub use tune::{CacheTuneParams, tune_impl};
