//! # FX Client
//!
//! Typed client for the upstream exchange-rate API, implementing the
//! [`RateSource`] port.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;

use fx_types::domain::DATE_FORMAT;
use fx_types::{RateSource, SourceError, TimeSeriesPayload};

/// Public exchange-rate API used when no upstream is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.exchangerate.host";

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ClientError> for SourceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_decode() => SourceError::Malformed(e.to_string()),
            ClientError::Http(e) => SourceError::Transport(e.to_string()),
            ClientError::Api { status, message } => SourceError::Upstream { status, message },
            ClientError::Json(e) => SourceError::Malformed(e.to_string()),
        }
    }
}

/// Exchange-rate API client.
///
/// No request timeout is set: a hung call is bounded by the caller's
/// cancellation, not by the client.
pub struct ExchangeRateClient {
    base_url: String,
    http: Client,
}

impl Default for ExchangeRateClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ExchangeRateClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(base_url, Client::new())
    }

    /// Creates a client with a connect timeout on the underlying pool.
    pub fn with_connect_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self::with_http(base_url, http))
    }

    /// Creates a client on top of an existing `reqwest::Client`.
    pub fn with_http(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks that the upstream API answers its `/latest` endpoint.
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn check_health(&self) -> Result<(), ClientError> {
        let url = format!("{}/latest", self.base_url);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("{} responded with {}", url, status),
            })
        }
    }

    /// Fetches the daily time series of `symbols` against `base`.
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn timeseries(
        &self,
        base: &str,
        from: NaiveDate,
        to: NaiveDate,
        symbols: &[String],
    ) -> Result<TimeSeriesPayload, ClientError> {
        let start_date = from.format(DATE_FORMAT).to_string();
        let end_date = to.format(DATE_FORMAT).to_string();
        let symbols = symbols.join(",");

        let resp = self
            .http
            .get(format!("{}/timeseries", self.base_url))
            .query(&[
                ("start_date", start_date.as_str()),
                ("end_date", end_date.as_str()),
                ("base", base),
                ("symbols", symbols.as_str()),
            ])
            .send()
            .await?;

        let payload: TimeSeriesPayload = self.handle_response(resp).await?;
        if let Some(message) = payload.failure() {
            return Err(ClientError::Api {
                status: 200,
                message,
            });
        }

        tracing::debug!(days = payload.rates.len(), "timeseries received");
        Ok(payload)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn fetch_timeseries(
        &self,
        base: &str,
        from: NaiveDate,
        to: NaiveDate,
        symbols: &[String],
    ) -> Result<TimeSeriesPayload, SourceError> {
        self.timeseries(base, from, to, symbols)
            .await
            .map_err(Into::into)
    }

    async fn check_health(&self) -> Result<(), SourceError> {
        ExchangeRateClient::check_health(self)
            .await
            .map_err(Into::into)
    }
}
