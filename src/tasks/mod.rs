//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - Stats Report: Logs cache statistics at configured intervals

mod report;

pub use report::spawn_stats_reporter;
