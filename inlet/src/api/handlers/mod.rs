//! HTTP request handlers.
//!
//! # Handler Modules
//!
//! - [`health`]: Liveness endpoint
//! - [`uploads`]: Payload intake endpoint
//!
//! Every handler starts by logging the request headers at DEBUG, one line
//! per header. That log is the main diagnostic surface of the service, so
//! both endpoints keep the same line format.

use axum::http::HeaderMap;

pub mod health;
pub mod uploads;

/// Log each request header at DEBUG, one line per header.
pub(crate) fn log_request_headers(headers: &HeaderMap) {
    for (name, value) in headers {
        tracing::debug!("Header '{}' = {}", name, value.to_str().unwrap_or("<non-ascii>"));
    }
}
