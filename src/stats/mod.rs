//! Affiliate stats API

pub mod client;
pub mod fetcher;
pub mod types;

pub use client::StatsClient;
pub use fetcher::{build_stats_url, fetch_stats, RequestHook, ResponseHook, StatsConfig};
pub use types::{Breakdown, Program, Range, StatsQuery, StatsResult, StatsRow};
