//! Result frames returned per query.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::TimeRange;
use super::series::{RateSeries, utc_date, utc_midnight};
use crate::error::QueryError;

/// Tabular time series: two ordered columns of equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    pub name: String,
    /// Name of the value column (the priced currency).
    pub symbol: String,
    pub times: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

impl DataFrame {
    /// Projects the samples of `series` lying strictly inside `range`.
    pub fn from_series(series: &RateSeries, range: &TimeRange) -> Self {
        let mut times = Vec::new();
        let mut values = Vec::new();

        for (date, rate) in series.range(utc_date(range.from), utc_date(range.to)) {
            let when = utc_midnight(date);
            if range.strictly_contains(when) {
                times.push(when);
                values.push(rate);
            }
        }

        Self {
            name: "response".to_string(),
            symbol: series.symbol().to_string(),
            times,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterates `(time, value)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }
}

pub type QueryResult = Result<DataFrame, QueryError>;

/// Results of a dispatched batch, keyed by `ref_id`.
///
/// After a cancellation this holds only the queries that finished in time.
#[derive(Debug, Default)]
pub struct BatchResponse {
    responses: HashMap<String, QueryResult>,
}

impl BatchResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ref_id: String, result: QueryResult) {
        self.responses.insert(ref_id, result);
    }

    pub fn get(&self, ref_id: &str) -> Option<&QueryResult> {
        self.responses.get(ref_id)
    }

    pub fn contains(&self, ref_id: &str) -> bool {
        self.responses.contains_key(ref_id)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &QueryResult)> {
        self.responses.iter()
    }

    pub fn into_inner(self) -> HashMap<String, QueryResult> {
        self.responses
    }
}
