//! Domain models for the rate series service.

pub mod frame;
pub mod query;
pub mod series;

pub use frame::{BatchResponse, DataFrame, QueryResult};
pub use query::{DataQuery, QueryModel, TimeRange};
pub use series::{DATE_FORMAT, PairKey, RateSeries, utc_date, utc_midnight};
