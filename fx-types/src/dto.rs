//! Data Transfer Objects for the upstream source and the query API.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BatchResponse, DataFrame, DataQuery, TimeRange};

// ─────────────────────────────────────────────────────────────────────────────
// Upstream DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a `/timeseries` response.
///
/// `rates` maps a `YYYY-MM-DD` date string to the per-symbol rates for that
/// day. Individual values may be `null`; they are treated as missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeSeriesPayload {
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub rates: HashMap<String, HashMap<String, Option<f64>>>,
    /// Some providers report failures in-band with a 200 status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl TimeSeriesPayload {
    /// Returns the in-band failure message, if the provider reported one.
    pub fn failure(&self) -> Option<String> {
        if self.success != Some(false) {
            return None;
        }
        let message = match &self.error {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(v) => v
                .get("info")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| v.to_string()),
            None => "request was not successful".to_string(),
        };
        Some(message)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Query API DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Batch of queries submitted to the query endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub queries: Vec<DataQuery>,
    /// Overrides the server's batch deadline, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Outcome of a single query: exactly one of `frame` or `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<DataFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Query string of the single-pair rates endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesParams {
    pub base: String,
    pub symbol: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl RatesParams {
    /// Single query covering these parameters, identified by `ref_id`.
    pub fn into_query(self, ref_id: &str) -> DataQuery {
        DataQuery::for_pair(
            ref_id,
            &self.base,
            &self.symbol,
            TimeRange::new(self.from, self.to),
        )
    }
}

/// Results keyed by `ref_id`. Queries that missed the deadline are absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    pub results: HashMap<String, QueryOutcome>,
}

impl From<BatchResponse> for QueryResponse {
    fn from(batch: BatchResponse) -> Self {
        let results = batch
            .into_inner()
            .into_iter()
            .map(|(ref_id, result)| {
                let outcome = match result {
                    Ok(frame) => QueryOutcome {
                        frame: Some(frame),
                        error: None,
                    },
                    Err(e) => QueryOutcome {
                        frame: None,
                        error: Some(e.to_string()),
                    },
                };
                (ref_id, outcome)
            })
            .collect();
        Self { results }
    }
}
