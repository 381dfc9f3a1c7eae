//! Metrics surface
//!
//! Serves the `aviary_*` instruments (request counts, the account and
//! follow-edge gauges, error counts) in Prometheus text format, and
//! carries the middleware that counts every routed request.

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};

use crate::error::AppError;
use crate::metrics::{HTTP_REQUESTS_TOTAL, REGISTRY};

/// Count a request against `aviary_http_requests_total`.
///
/// Applied as a top-level layer so every routed endpoint is counted
/// with the same labels: method, the matched route pattern (not the
/// raw path, to keep label cardinality bounded), and response status.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &endpoint, response.status().as_str()])
        .inc();

    response
}

/// GET /metrics
///
/// Renders everything registered in the aviary registry.
async fn serve_metrics() -> Result<Response, AppError> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();

    let body = encoder
        .encode_to_string(&families)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("metrics encoding failed: {e}")))?;

    Ok(([(header::CONTENT_TYPE, encoder.format_type())], body).into_response())
}

/// Create metrics router
///
/// Authentication is applied by the top-level router composition.
pub fn metrics_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/metrics", get(serve_metrics))
}
