//! Time-to-live policy for freshly fetched series.
//!
//! The upstream source publishes one sample per day. A series that already
//! holds today's sample cannot change until the next UTC day starts, so it is
//! trusted until midnight. Anything else is only trusted briefly, which still
//! lets backfilled or corrected history reach callers.

use std::time::Duration;

use chrono::{DateTime, Utc};

use fx_types::RateSeries;
use fx_types::domain::{utc_date, utc_midnight};

/// TTL for series that do not include today's sample.
pub const STALE_WINDOW_TTL: Duration = Duration::from_secs(5 * 60);

/// How long `series` may be served from cache, evaluated at `now`.
pub fn ttl_for(series: &RateSeries, now: DateTime<Utc>) -> Duration {
    ttl_with_stale_window(series, now, STALE_WINDOW_TTL)
}

/// [`ttl_for`] with a custom TTL for series lacking today's sample.
pub fn ttl_with_stale_window(
    series: &RateSeries,
    now: DateTime<Utc>,
    stale_window: Duration,
) -> Duration {
    if series.contains(utc_date(now)) {
        until_next_utc_midnight(now).unwrap_or(stale_window)
    } else {
        stale_window
    }
}

/// [`ttl_for`] evaluated at the current instant.
pub fn ttl_for_now(series: &RateSeries) -> Duration {
    ttl_for(series, Utc::now())
}

fn until_next_utc_midnight(now: DateTime<Utc>) -> Option<Duration> {
    utc_date(now)
        .succ_opt()
        .map(utc_midnight)
        .and_then(|midnight| (midnight - now).to_std().ok())
}
