//! Series cache: one entry per currency pair.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use fx_types::{PairKey, RateSeries};

use crate::cost::CostWeightedCache;
use crate::ttl::{STALE_WINDOW_TTL, ttl_with_stale_window};

/// Default cost budget: 32 MiB of estimated series footprint.
pub const DEFAULT_MAX_COST: u64 = 32 * 1024 * 1024;

/// Series cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Upper bound on the summed cost of live entries.
    pub max_cost: u64,
    /// TTL for series that do not include today's sample.
    pub stale_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cost: DEFAULT_MAX_COST,
            stale_ttl: STALE_WINDOW_TTL,
        }
    }
}

/// Process-wide cache of rate series keyed by `(base, symbol)`.
///
/// A hit returns the whole stored series regardless of the range it was
/// originally fetched for; callers check coverage themselves.
pub struct SeriesCache {
    entries: CostWeightedCache<PairKey, Arc<RateSeries>>,
    stale_ttl: Duration,
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl SeriesCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: CostWeightedCache::new(config.max_cost),
            stale_ttl: config.stale_ttl,
        }
    }

    pub async fn get(&self, key: &PairKey) -> Option<Arc<RateSeries>> {
        self.entries.get(key).await
    }

    /// Stores `series` under its pair, replacing any previous entry.
    ///
    /// Returns the TTL it was stored with, or `None` if admission was refused.
    pub async fn store(&self, series: Arc<RateSeries>) -> Option<Duration> {
        self.store_at(series, Utc::now()).await
    }

    /// [`store`](Self::store) with the TTL evaluated at `now`.
    pub async fn store_at(&self, series: Arc<RateSeries>, now: DateTime<Utc>) -> Option<Duration> {
        let ttl = ttl_with_stale_window(&series, now, self.stale_ttl);
        let cost = series.cost();
        let key = series.key().clone();

        if self.entries.set(key.clone(), series, cost, ttl).await {
            tracing::debug!(pair = %key, cost, ?ttl, "series cached");
            Some(ttl)
        } else {
            tracing::debug!(pair = %key, cost, "series not admitted");
            None
        }
    }

    pub async fn invalidate(&self, key: &PairKey) {
        self.entries.invalidate(key).await;
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }

    pub fn weighted_size(&self) -> u64 {
        self.entries.weighted_size()
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}
