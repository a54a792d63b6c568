//! Cost-weighted cache with per-entry expiration, backed by moka.

use std::hash::Hash;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;

/// Stored value with the bookkeeping the policy needs.
#[derive(Clone)]
struct Weighted<V> {
    value: V,
    cost: u32,
    ttl: Duration,
}

/// Expires each entry after the TTL it was inserted with.
struct PerEntryTtl;

impl<K, V> Expiry<K, Weighted<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &K,
        entry: &Weighted<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &K,
        entry: &Weighted<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Key/value store bounded by the total cost of its entries.
///
/// Admission and eviction follow moka's TinyLFU policy, so a `set` may be
/// silently dropped when the budget is under pressure. Expired entries are
/// never returned by [`get`](Self::get) and are reclaimed lazily.
pub struct CostWeightedCache<K, V> {
    inner: Cache<K, Weighted<V>>,
    max_cost: u64,
}

impl<K, V> CostWeightedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache whose live entries may total at most `max_cost`.
    pub fn new(max_cost: u64) -> Self {
        let inner = Cache::<K, Weighted<V>>::builder()
            .max_capacity(max_cost)
            .weigher(|_key: &K, entry: &Weighted<V>| -> u32 { entry.cost })
            .expire_after(PerEntryTtl)
            .build();

        Self { inner, max_cost }
    }

    /// Looks up `key`. `None` covers absence, expiry and eviction races.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await.map(|entry| entry.value)
    }

    /// Offers an entry for admission, replacing any previous value for `key`.
    ///
    /// Returns `false` when the entry can never fit (cost above the whole
    /// budget, or a zero TTL); the previous value is dropped in that case.
    /// A `true` return does not guarantee the policy keeps the entry.
    pub async fn set(&self, key: K, value: V, cost: usize, ttl: Duration) -> bool {
        let cost = u32::try_from(cost).unwrap_or(u32::MAX);

        if ttl.is_zero() || u64::from(cost) > self.max_cost {
            tracing::debug!(cost, max_cost = self.max_cost, ?ttl, "cache admission refused");
            self.inner.invalidate(&key).await;
            return false;
        }

        self.inner.insert(key, Weighted { value, cost, ttl }).await;
        true
    }

    pub async fn invalidate(&self, key: &K) {
        self.inner.invalidate(key).await;
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    /// Applies pending admissions, evictions and expirations.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Total cost of the entries currently accounted for.
    pub fn weighted_size(&self) -> u64 {
        self.inner.weighted_size()
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn max_cost(&self) -> u64 {
        self.max_cost
    }
}
