//! # FX Hex
//!
//! Application layer and HTTP adapter for the exchange-rate series service.
//!
//! ## Architecture
//!
//! - `service/` - Range fetcher (cache lookup, coverage check, upstream fetch)
//! - `dispatch/` - Concurrent batch execution under a cancellable deadline
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! Everything is generic over `S: RateSource`, so the upstream adapter is
//! injected at compile time and tests run against in-memory sources.

pub mod dispatch;
pub mod inbound;
pub mod service;


pub use dispatch::Dispatcher;
pub use service::RateService;
pub use tokio_util::sync::CancellationToken;
