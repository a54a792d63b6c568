//! HTTP request handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use fx_types::{AppError, DataFrame, QueryRequest, QueryResponse, RateSource, RatesParams};

use crate::Dispatcher;

/// Application state shared across handlers.
pub struct AppState<S: RateSource> {
    pub dispatcher: Dispatcher<S>,
    /// Cancelled on shutdown; every batch runs under a child of it.
    pub shutdown: CancellationToken,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint. Probes the upstream rate source.
pub async fn health<S: RateSource>(State(state): State<Arc<AppState<S>>>) -> Response {
    match state.dispatcher.service().source().check_health().await {
        Ok(()) => Json(serde_json::json!({ "status": "healthy" })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "upstream health check failed");
            let body = serde_json::json!({ "status": "unhealthy", "error": e.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

/// Runs a batch of queries and returns whatever finished before the deadline.
#[tracing::instrument(skip(state, req), fields(queries = req.queries.len()))]
pub async fn query<S: RateSource>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.queries.is_empty() {
        return Err(AppError::BadRequest("At least one query is required".into()).into());
    }

    let deadline = req
        .timeout_ms
        .map(Duration::from_millis)
        .or(state.dispatcher.timeout())
        .map(|timeout| Instant::now() + timeout);

    let cancel = state.shutdown.child_token();
    let batch = state
        .dispatcher
        .dispatch_until(req.queries, &cancel, deadline)
        .await;

    Ok(Json(QueryResponse::from(batch)))
}

/// Rates for one pair over one range, returned as a bare frame.
///
/// Invalid parameters answer 400, upstream failures 503, and an
/// undecodable upstream payload 500.
#[tracing::instrument(skip(state))]
pub async fn rates<S: RateSource>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<RatesParams>,
) -> Result<Json<DataFrame>, ApiError> {
    const REF_ID: &str = "rates";

    let cancel = state.shutdown.child_token();
    let mut batch = state
        .dispatcher
        .dispatch(vec![params.into_query(REF_ID)], &cancel)
        .await
        .into_inner();

    match batch.remove(REF_ID) {
        Some(result) => Ok(Json(result.map_err(AppError::from)?)),
        None => Err(AppError::Unavailable("query did not finish in time".into()).into()),
    }
}

/// Cache occupancy, for diagnostics.
pub async fn cache_stats<S: RateSource>(State(state): State<Arc<AppState<S>>>) -> impl IntoResponse {
    let service = state.dispatcher.service();
    let cache = service.cache();
    Json(serde_json::json!({
        "entries": cache.entry_count(),
        "weighted_size": cache.weighted_size(),
        "in_flight": service.in_flight_pairs(),
    }))
}
