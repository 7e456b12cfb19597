//! HTTP handler for the liveness endpoint.

use axum::http::HeaderMap;

use super::log_request_headers;

#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    summary = "Health check",
    description = "Liveness check. Always answers with the literal body `Ok`.",
    responses(
        (status = 200, description = "Service is up", body = String),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn health(headers: HeaderMap) -> &'static str {
    log_request_headers(&headers);
    "Ok"
}
