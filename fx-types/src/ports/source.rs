//! Upstream rate source port.
//!
//! Implementations can be HTTP clients, fixtures, mocks, etc.

use chrono::NaiveDate;

use crate::dto::TimeSeriesPayload;
use crate::error::SourceError;

/// Port trait for historical exchange-rate providers.
#[async_trait::async_trait]
pub trait RateSource: Send + Sync + 'static {
    /// Fetches daily rates of `symbols` against `base` for the inclusive
    /// window `[from, to]`.
    ///
    /// Transport failures, non-success statuses and undecodable bodies are
    /// errors. Implementations must not retry.
    async fn fetch_timeseries(
        &self,
        base: &str,
        from: NaiveDate,
        to: NaiveDate,
        symbols: &[String],
    ) -> Result<TimeSeriesPayload, SourceError>;

    /// Reports whether the source is reachable. Sources without a probe are
    /// assumed healthy.
    async fn check_health(&self) -> Result<(), SourceError> {
        Ok(())
    }
}
