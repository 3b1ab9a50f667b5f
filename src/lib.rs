//! Leadrank - lead search and scoring engine
//!
//! Turns filter/sort parameters into a ranked, paginated page of leads, each
//! carrying a 0-100 composite quality score. Results are cached with a TTL
//! and can be proactively re-warmed.
//!
//! The engine owns no I/O of its own: the record store, inference backend,
//! and cache store are supplied through [`RecordStore`], [`InferenceService`]
//! and [`CacheStore`].

pub mod ai;
pub mod cache;
pub mod cli;
pub mod core;
pub mod scoring;
pub mod search;
pub mod store;

pub use ai::InferenceService;
pub use cache::{CacheStore, WarmupReport, WarmupStrategy};
pub use core::config::Config;
pub use core::error::{Error, Result};
pub use search::{ScoringCriteria, SearchEngine, SearchRequest, SearchResult};
pub use store::RecordStore;
