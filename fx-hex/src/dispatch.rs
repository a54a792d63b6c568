//! Batch query dispatcher.
//!
//! Fans a batch out to one task per query and gathers the results until
//! every query has answered, the batch is cancelled, or its deadline passes.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use fx_types::domain::utc_date;
use fx_types::{BatchResponse, DataFrame, DataQuery, QueryError, QueryModel, QueryResult, RateSource};

use crate::RateService;

/// Runs batches of independent queries against a shared [`RateService`].
pub struct Dispatcher<S: RateSource> {
    service: Arc<RateService<S>>,
    timeout: Option<Duration>,
}

impl<S: RateSource> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            timeout: self.timeout,
        }
    }
}

impl<S: RateSource> Dispatcher<S> {
    pub fn new(service: Arc<RateService<S>>) -> Self {
        Self {
            service,
            timeout: None,
        }
    }

    /// Sets a deadline applied to every batch, measured from dispatch.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn service(&self) -> &RateService<S> {
        &self.service
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs `queries` concurrently under the configured timeout.
    pub async fn dispatch(&self, queries: Vec<DataQuery>, cancel: &CancellationToken) -> BatchResponse {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        self.dispatch_until(queries, cancel, deadline).await
    }

    /// Runs `queries` concurrently, returning once all have answered or
    /// `cancel` fires or `deadline` passes.
    ///
    /// An early return yields only the results collected so far. Queries
    /// still running are left to finish in the background and their results
    /// are dropped. A failing query only affects its own slot.
    #[tracing::instrument(skip_all, fields(queries = queries.len()))]
    pub async fn dispatch_until(
        &self,
        queries: Vec<DataQuery>,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> BatchResponse {
        let mut response = BatchResponse::new();
        let (tx, mut rx) = mpsc::channel::<(String, QueryResult)>(queries.len().max(1));

        let mut seen = HashSet::new();
        let mut pending = 0usize;
        for query in queries {
            if !seen.insert(query.ref_id.clone()) {
                tracing::warn!(ref_id = %query.ref_id, "duplicate ref_id in batch, skipping");
                continue;
            }

            let service = Arc::clone(&self.service);
            let tx = tx.clone();
            pending += 1;
            tokio::spawn(async move {
                let ref_id = query.ref_id.clone();
                let result = run_query(&service, query).await;
                if let Err(e) = &result {
                    tracing::warn!(ref_id = %ref_id, error = %e, "query failed");
                }
                // The receiver is gone once the batch has returned early.
                let _ = tx.send((ref_id, result)).await;
            });
        }
        drop(tx);

        let expired = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(expired);

        while pending > 0 {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some((ref_id, result)) => {
                        response.insert(ref_id, result);
                        pending -= 1;
                    }
                    // Only reachable if a query task panicked.
                    None => break,
                },
                _ = cancel.cancelled() => {
                    tracing::warn!(completed = response.len(), pending, "batch cancelled");
                    break;
                }
                _ = &mut expired => {
                    tracing::warn!(completed = response.len(), pending, "batch deadline passed");
                    break;
                }
            }
        }

        tracing::debug!(completed = response.len(), "batch finished");
        response
    }
}

/// Decodes one query, fetches its widened range and projects the result
/// back onto the requested range.
async fn run_query<S: RateSource>(service: &RateService<S>, query: DataQuery) -> QueryResult {
    let model = QueryModel::decode(&query.model)?;
    let range = query.time_range;
    if range.from > range.to {
        return Err(QueryError::InvalidQuery(format!(
            "time range starts after it ends ({} > {})",
            range.from, range.to
        )));
    }

    let widened = range.widened();
    let series = service
        .fetch_range(
            &model.base_currency,
            &model.to_currency,
            utc_date(widened.from),
            utc_date(widened.to),
        )
        .await?;

    Ok(DataFrame::from_series(&series, &range))
}
