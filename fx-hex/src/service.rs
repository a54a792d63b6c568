//! Rate Application Service
//!
//! Answers range requests for one currency pair from the series cache,
//! falling back to the upstream source when the cached series does not
//! cover the request.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use fx_cache::SeriesCache;
use fx_types::{PairKey, RateSeries, RateSource, SourceError};

/// Range fetcher over a shared series cache.
///
/// Generic over `S: RateSource` - the upstream adapter is injected at
/// compile time.
///
/// By default there is no lock around check-then-fetch-then-store: two
/// concurrent misses for one pair both fetch and the last store wins.
/// [`with_single_flight`](Self::with_single_flight) serializes fetches per
/// pair instead.
pub struct RateService<S: RateSource> {
    source: S,
    cache: Arc<SeriesCache>,
    in_flight: Option<DashMap<PairKey, Arc<Mutex<()>>>>,
}

impl<S: RateSource> RateService<S> {
    /// Creates a new service over `source`, sharing `cache`.
    pub fn new(source: S, cache: Arc<SeriesCache>) -> Self {
        Self {
            source,
            cache,
            in_flight: None,
        }
    }

    /// Enables one in-flight upstream fetch per pair. Waiters re-check the
    /// cache once the running fetch has stored its series.
    pub fn with_single_flight(mut self) -> Self {
        self.in_flight = Some(DashMap::new());
        self
    }

    /// Returns a reference to the upstream source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns a reference to the shared cache.
    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    /// Returns a series for `base`/`symbol` that contains both `from` and `to`
    /// if the upstream has them.
    ///
    /// A cached series is returned as-is when it holds both endpoint dates,
    /// whatever it holds in between. Otherwise the inclusive window
    /// `[from, to]` is fetched for this symbol alone and replaces the cached
    /// entry.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_range(
        &self,
        base: &str,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Arc<RateSeries>, SourceError> {
        let key = PairKey::new(base, symbol);

        if let Some(series) = self.cached(&key, from, to).await {
            return Ok(series);
        }

        let Some(in_flight) = &self.in_flight else {
            return self.fetch_and_store(key, from, to).await;
        };

        let lock = in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _slot = InFlightSlot {
            permit: Some(lock.lock_owned().await),
            map: in_flight,
            key: key.clone(),
        };

        if let Some(series) = self.cached(&key, from, to).await {
            tracing::debug!(pair = %key, "served by concurrent fetch");
            return Ok(series);
        }
        self.fetch_and_store(key, from, to).await
    }

    /// Pairs with a single-flight lock currently allocated.
    pub fn in_flight_pairs(&self) -> usize {
        self.in_flight.as_ref().map_or(0, DashMap::len)
    }

    async fn cached(&self, key: &PairKey, from: NaiveDate, to: NaiveDate) -> Option<Arc<RateSeries>> {
        let series = self.cache.get(key).await?;
        if series.covers(from, to) {
            tracing::debug!(pair = %key, samples = series.len(), "cache hit");
            Some(series)
        } else {
            // TODO: check intermediate days, not just the endpoints.
            tracing::debug!(pair = %key, "cached series misses an endpoint");
            None
        }
    }

    async fn fetch_and_store(
        &self,
        key: PairKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Arc<RateSeries>, SourceError> {
        let symbols = [key.symbol().to_string()];
        let payload = self
            .source
            .fetch_timeseries(key.base(), from, to, &symbols)
            .await
            .inspect_err(|e| tracing::warn!(pair = %key, error = %e, "upstream fetch failed"))?;

        let series = Arc::new(RateSeries::from_payload(key, &payload));
        tracing::info!(
            pair = %series.key(),
            samples = series.len(),
            days = payload.rates.len(),
            "fetched series"
        );

        self.cache.store(Arc::clone(&series)).await;
        Ok(series)
    }
}

/// Held while a pair's fetch runs. On drop it releases the lock, then
/// removes the pair's entry unless another caller still holds or waits on it.
struct InFlightSlot<'a> {
    permit: Option<OwnedMutexGuard<()>>,
    map: &'a DashMap<PairKey, Arc<Mutex<()>>>,
    key: PairKey,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.permit.take();
        self.map
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
