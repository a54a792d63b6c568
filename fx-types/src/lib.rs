//! # FX Types
//!
//! Domain types and port traits for the exchange-rate time-series service.
//! This crate has ZERO external IO dependencies - only data structures,
//! series invariants, and trait definitions.
//!
//! ## Architecture
//!
//! - `domain/` - Rate series, queries and result frames
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Wire shapes exchanged with the upstream rate source
//! - `error/` - Source and query error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    BatchResponse, DataFrame, DataQuery, PairKey, QueryModel, QueryResult, RateSeries, TimeRange,
};
pub use dto::{QueryOutcome, QueryRequest, QueryResponse, RatesParams, TimeSeriesPayload};
pub use error::{AppError, QueryError, SourceError};
pub use ports::RateSource;
