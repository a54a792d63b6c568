//! # FX Cache
//!
//! Caching layer for exchange-rate series:
//!
//! - [`CostWeightedCache`] - generic key/value store that accounts a declared
//!   cost per entry against a global budget, with a deadline per entry.
//! - [`ttl`] - how long a freshly fetched series may be trusted.
//! - [`SeriesCache`] - one entry per currency pair, cost and TTL derived
//!   from the series itself.
//!
//! Cache operations never fail. A rejected admission or an eviction race
//! simply shows up as a miss on the next lookup.

mod cost;
mod series;
pub mod ttl;

pub use cost::CostWeightedCache;
pub use series::{CacheConfig, SeriesCache};
pub use ttl::{STALE_WINDOW_TTL, ttl_for, ttl_for_now, ttl_with_stale_window};
