//! Ordered per-day rate samples for one currency pair.

use std::collections::HashMap;
use std::fmt;
use std::mem::size_of;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::dto::TimeSeriesPayload;

/// Date format used by the upstream source for both query parameters and
/// the keys of the `rates` object.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const SAMPLE_COST: usize = size_of::<NaiveDate>() + size_of::<f64>();
const ORDER_ENTRY_COST: usize = size_of::<NaiveDate>();

/// Normalizes an instant to its UTC calendar date.
pub fn utc_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Returns the UTC midnight instant a sample for `date` is stamped with.
pub fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Cache key for one currency pair, e.g. `USD-EUR`.
///
/// Codes are trimmed and upper-cased so `usd`/`USD` share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    base: String,
    symbol: String,
}

impl PairKey {
    pub fn new(base: &str, symbol: &str) -> Self {
        Self {
            base: base.trim().to_uppercase(),
            symbol: symbol.trim().to_uppercase(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.symbol)
    }
}

/// Exchange rates of `symbol` against `base`, one sample per UTC day.
///
/// `order` always holds exactly the keys of `samples`, strictly ascending.
/// A series is never mutated after construction; a request needing a range
/// it does not cover replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSeries {
    key: PairKey,
    samples: HashMap<NaiveDate, f64>,
    order: Vec<NaiveDate>,
}

impl RateSeries {
    /// Creates a series with no samples.
    pub fn empty(key: PairKey) -> Self {
        Self {
            key,
            samples: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Builds a series from samples arriving in any order.
    ///
    /// A date seen twice keeps its last rate and appears once in `order`.
    pub fn from_samples(key: PairKey, samples: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        let mut series = Self::empty(key);
        for (date, rate) in samples {
            if series.samples.insert(date, rate).is_none() {
                series.order.push(date);
            }
        }
        // Stable, and done once after collection.
        series.order.sort();
        series
    }

    /// Builds the series for `key.symbol()` out of an upstream payload.
    ///
    /// Dates that fail to parse and days without a value for the symbol are
    /// skipped rather than treated as errors.
    pub fn from_payload(key: PairKey, payload: &TimeSeriesPayload) -> Self {
        let symbol = key.symbol().to_string();
        let samples = payload.rates.iter().filter_map(|(raw, day)| {
            let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()?;
            let rate = (*day.get(&symbol)?)?;
            Some((date, rate))
        });
        Self::from_samples(key, samples)
    }

    pub fn key(&self) -> &PairKey {
        &self.key
    }

    pub fn base(&self) -> &str {
        self.key.base()
    }

    pub fn symbol(&self) -> &str {
        self.key.symbol()
    }

    /// Dates present in the series, ascending.
    pub fn order(&self) -> &[NaiveDate] {
        &self.order
    }

    pub fn rate(&self, date: NaiveDate) -> Option<f64> {
        self.samples.get(&date).copied()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.samples.contains_key(&date)
    }

    /// Coverage check used by the range fetcher.
    ///
    /// Only the two endpoint dates are tested; gaps in between are not
    /// detected.
    pub fn covers(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.contains(from) && self.contains(to)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.order.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.order.last().copied()
    }

    /// All samples in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.order
            .iter()
            .filter_map(|date| self.samples.get(date).map(|rate| (*date, *rate)))
    }

    /// Samples dated within `[from, to]`, located by binary search on `order`.
    pub fn range(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        let start = self.order.partition_point(|d| *d < from);
        let end = self.order.partition_point(|d| *d <= to).max(start);
        self.order[start..end]
            .iter()
            .filter_map(|date| self.samples.get(date).map(|rate| (*date, *rate)))
    }

    /// Estimated memory footprint, used only for cache accounting.
    pub fn cost(&self) -> usize {
        self.samples.len() * SAMPLE_COST + self.order.len() * ORDER_ENTRY_COST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn payload(body: &str) -> TimeSeriesPayload {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_pair_key_normalizes_codes() {
        let key = PairKey::new(" usd", "eur ");
        assert_eq!(key.to_string(), "USD-EUR");
        assert_eq!(key, PairKey::new("USD", "EUR"));
    }

    #[test]
    fn test_order_matches_sorted_sample_keys() {
        let body = r#"{"base":"USD","rates":{
            "2024-01-03":{"EUR":0.92},
            "2024-01-01":{"EUR":0.90},
            "2023-12-29":{"EUR":0.89},
            "2024-01-02":{"EUR":0.91}
        }}"#;
        let series = RateSeries::from_payload(PairKey::new("USD", "EUR"), &payload(body));

        let mut keys: Vec<NaiveDate> = series.samples.keys().copied().collect();
        keys.sort();
        assert_eq!(series.order(), keys.as_slice());
        assert!(series.order().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn test_bad_dates_and_missing_symbol_are_skipped() {
        let body = r#"{"base":"USD","rates":{
            "2024-01-01":{"EUR":0.90},
            "not-a-date":{"EUR":1.0},
            "2024-01-02":{"GBP":0.78},
            "2024-01-03":{"EUR":null},
            "2024-01-04":{"EUR":0.93}
        }}"#;
        let series = RateSeries::from_payload(PairKey::new("USD", "EUR"), &payload(body));

        assert_eq!(series.order(), &[date("2024-01-01"), date("2024-01-04")]);
        assert_eq!(series.rate(date("2024-01-04")), Some(0.93));
        assert!(!series.contains(date("2024-01-02")));
    }

    #[test]
    fn test_duplicate_dates_appear_once() {
        let d = date("2024-01-01");
        let series = RateSeries::from_samples(
            PairKey::new("USD", "EUR"),
            vec![(d, 0.90), (date("2023-12-31"), 0.89), (d, 0.95)],
        );
        assert_eq!(series.order(), &[date("2023-12-31"), d]);
        assert_eq!(series.rate(d), Some(0.95));
    }

    #[test]
    fn test_covers_checks_endpoints_only() {
        let series = RateSeries::from_samples(
            PairKey::new("USD", "EUR"),
            vec![(date("2024-01-01"), 0.90), (date("2024-01-05"), 0.94)],
        );
        // The gap between the endpoints is not detected.
        assert!(series.covers(date("2024-01-01"), date("2024-01-05")));
        assert!(!series.covers(date("2024-01-01"), date("2024-01-06")));
    }

    #[test]
    fn test_range_slices_inclusive_bounds() {
        let series = RateSeries::from_samples(
            PairKey::new("USD", "EUR"),
            (1..=9).map(|d| (NaiveDate::from_ymd_opt(2024, 1, d).unwrap(), d as f64)),
        );
        let slice: Vec<f64> = series
            .range(date("2024-01-03"), date("2024-01-05"))
            .map(|(_, r)| r)
            .collect();
        assert_eq!(slice, vec![3.0, 4.0, 5.0]);
        assert_eq!(series.range(date("2024-02-01"), date("2024-01-01")).count(), 0);
    }

    #[test]
    fn test_cost_scales_with_samples() {
        let empty = RateSeries::empty(PairKey::new("USD", "EUR"));
        assert_eq!(empty.cost(), 0);

        let series = RateSeries::from_samples(
            PairKey::new("USD", "EUR"),
            vec![(date("2024-01-01"), 0.90), (date("2024-01-02"), 0.91)],
        );
        assert_eq!(series.cost(), 2 * (SAMPLE_COST + ORDER_ENTRY_COST));
    }

    #[test]
    fn test_utc_midnight_round_trips_date() {
        let d = date("2024-01-02");
        assert_eq!(utc_date(utc_midnight(d)), d);
    }
}
