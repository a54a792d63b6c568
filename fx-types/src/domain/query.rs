//! Queries accepted by the dispatcher.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::series::PairKey;
use crate::error::QueryError;

/// Time window a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// The range with `from` moved one day earlier, so charts get a leading
    /// point instead of starting on a cliff.
    pub fn widened(&self) -> Self {
        Self {
            from: self
                .from
                .checked_sub_signed(TimeDelta::days(1))
                .unwrap_or(self.from),
            to: self.to,
        }
    }

    /// True when `instant` lies strictly inside the range.
    pub fn strictly_contains(&self, instant: DateTime<Utc>) -> bool {
        instant > self.from && instant < self.to
    }
}

/// Parameters carried in a query's raw model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryModel {
    pub base_currency: String,
    pub to_currency: String,
}

impl QueryModel {
    /// Decodes and validates a raw model.
    pub fn decode(raw: &serde_json::Value) -> Result<Self, QueryError> {
        let model: QueryModel = serde_json::from_value(raw.clone())
            .map_err(|e| QueryError::InvalidQuery(format!("Malformed query model: {}", e)))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), QueryError> {
        for (field, code) in [
            ("baseCurrency", &self.base_currency),
            ("toCurrency", &self.to_currency),
        ] {
            let code = code.trim();
            if code.is_empty() {
                return Err(QueryError::InvalidQuery(format!("{} is required", field)));
            }
            if !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(QueryError::InvalidQuery(format!(
                    "{} must be an alphabetic currency code, got {:?}",
                    field, code
                )));
            }
        }
        Ok(())
    }

    pub fn pair(&self) -> PairKey {
        PairKey::new(&self.base_currency, &self.to_currency)
    }
}

/// One query of a batch.
///
/// `ref_id` is unique within the batch and correlates the result; `model`
/// is decoded per query so a malformed one only fails its own slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQuery {
    pub ref_id: String,
    pub model: serde_json::Value,
    pub time_range: TimeRange,
}

impl DataQuery {
    pub fn new(ref_id: impl Into<String>, model: serde_json::Value, time_range: TimeRange) -> Self {
        Self {
            ref_id: ref_id.into(),
            model,
            time_range,
        }
    }

    /// Convenience constructor for callers that already hold decoded codes.
    pub fn for_pair(
        ref_id: impl Into<String>,
        base: &str,
        symbol: &str,
        time_range: TimeRange,
    ) -> Self {
        Self::new(
            ref_id,
            serde_json::json!({ "baseCurrency": base, "toCurrency": symbol }),
            time_range,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_widened_moves_from_back_one_day() {
        let range = TimeRange::new(at(2024, 1, 1), at(2024, 1, 3)).widened();
        assert_eq!(range.from, at(2023, 12, 31));
        assert_eq!(range.to, at(2024, 1, 3));
    }

    #[test]
    fn test_strictly_contains_excludes_bounds() {
        let range = TimeRange::new(at(2024, 1, 1), at(2024, 1, 3));
        assert!(!range.strictly_contains(at(2024, 1, 1)));
        assert!(range.strictly_contains(at(2024, 1, 2)));
        assert!(!range.strictly_contains(at(2024, 1, 3)));
    }

    #[test]
    fn test_decode_model() {
        let raw = serde_json::json!({ "baseCurrency": "usd", "toCurrency": "EUR" });
        let model = QueryModel::decode(&raw).unwrap();
        assert_eq!(model.pair().to_string(), "USD-EUR");
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let raw = serde_json::json!({ "baseCurrency": "USD" });
        assert!(matches!(
            QueryModel::decode(&raw),
            Err(QueryError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_decode_rejects_blank_or_odd_codes() {
        let blank = serde_json::json!({ "baseCurrency": " ", "toCurrency": "EUR" });
        assert!(QueryModel::decode(&blank).is_err());

        let odd = serde_json::json!({ "baseCurrency": "USD", "toCurrency": "EU,R" });
        assert!(QueryModel::decode(&odd).is_err());
    }
}
