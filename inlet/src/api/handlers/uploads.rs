//! HTTP handler for payload intake.
//!
//! A posted body is wrapped in a one-field JSON envelope and written to blob
//! storage under a name derived from the current UTC time. The response is
//! always 200 with the blob name; storage failures are logged, not surfaced.

use axum::{body::Bytes, extract::State, http::HeaderMap};
use chrono::{DateTime, Utc};

use super::log_request_headers;
use crate::AppState;
use crate::config::StorageConfig;
use crate::errors::{Error, Result};
use crate::storage::BlobStore;

#[utoipa::path(
    post,
    path = "/upload",
    tag = "service",
    summary = "Upload a payload",
    description = "Wraps the posted body in a JSON envelope and stores it as a blob named after \
        the current time. Answers with the blob name whether or not the store succeeded.",
    request_body(content = String, description = "Raw payload to store", content_type = "text/plain"),
    responses(
        (status = 200, description = "Name of the blob the payload was stored under", body = String),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> String {
    log_request_headers(&headers);

    // Any byte payload is accepted; invalid UTF-8 decodes lossily.
    let body = String::from_utf8_lossy(&body);
    let blob_name = format_blob_name(Utc::now());

    // Storage failures do not change the response: the caller gets the blob
    // name back either way and the failure is only visible in the logs.
    if let Err(err) = store_payload(&state.config.storage, &blob_name, &body).await {
        match &err {
            Error::NotConfigured { .. } => {
                tracing::error!("Storage not configured: failed to upload file {}: {}", blob_name, err)
            }
            Error::ContainerNotFound { .. } => {
                tracing::error!("Container not found: failed to upload file {}: {}", blob_name, err)
            }
            Error::ContainerAlreadyExists { .. } => {
                tracing::error!("Container already exists: failed to upload file {}: {}", blob_name, err)
            }
            Error::ContainerBusy { .. } => {
                tracing::error!("Container busy: failed to upload file {}: {}", blob_name, err)
            }
            Error::Transport { .. } => {
                tracing::error!("Transport failure: failed to upload file {}: {}", blob_name, err)
            }
            Error::Storage { .. } => {
                tracing::error!("Storage error: failed to upload file {}: {}", blob_name, err)
            }
        }
    }

    blob_name
}

/// Blob names are wall-clock UTC timestamps at whole-second precision.
///
/// Two uploads inside the same second get the same name, and the later write
/// overwrites the earlier one.
fn format_blob_name(now: DateTime<Utc>) -> String {
    format!("{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Wrap the payload in its storage envelope.
///
/// The payload is spliced in verbatim: a payload containing `"` or `\` makes
/// the stored document invalid JSON. Consumers of the stored blobs depend on
/// these exact bytes, so the splice stays as is.
fn wrap_message(body: &str) -> String {
    format!(r#"{{"message": "{body}"}}"#)
}

/// Store one payload, building a fresh storage client for this request.
async fn store_payload(config: &StorageConfig, blob_name: &str, body: &str) -> Result<()> {
    let store = BlobStore::connect(config).await?;
    store.ensure_container().await?;
    store.put_blob(blob_name, wrap_message(body).into_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_utils::{create_test_app, test_config};
    use chrono::{TimeDelta, TimeZone};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_blob_name_formats_utc_seconds() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 45).unwrap();
        assert_eq!(format_blob_name(t), "20240115_093045.json");
    }

    #[test]
    fn test_blob_names_collide_within_one_second() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 45).unwrap();
        assert_eq!(format_blob_name(t), format_blob_name(t + TimeDelta::milliseconds(700)));
        assert_ne!(format_blob_name(t), format_blob_name(t + TimeDelta::milliseconds(1000)));
    }

    #[test]
    fn test_envelope_wraps_body_verbatim() {
        let wrapped = wrap_message("hello");
        assert_eq!(wrapped, r#"{"message": "hello"}"#);
        let parsed: serde_json::Value = serde_json::from_str(&wrapped).unwrap();
        assert_eq!(parsed["message"], "hello");
    }

    #[test]
    fn test_envelope_keeps_quotes_unescaped() {
        let wrapped = wrap_message(r#"say "hi""#);
        assert_eq!(wrapped, r#"{"message": "say "hi""}"#);
        // The verbatim splice means a payload with quotes is stored as invalid JSON
        assert!(serde_json::from_str::<serde_json::Value>(&wrapped).is_err());
    }

    /// Assert that `body` looks like `yyyyMMdd_HHmmss.json`.
    fn assert_blob_name(body: &str) {
        assert_eq!(body.len(), 20, "unexpected blob name: {body}");
        let (stamp, suffix) = body.split_at(15);
        assert_eq!(suffix, ".json", "unexpected blob name: {body}");
        let (date, time) = stamp.split_at(8);
        let time = time.strip_prefix('_').expect("missing date/time separator");
        assert!(date.chars().all(|c| c.is_ascii_digit()), "unexpected blob name: {body}");
        assert!(time.chars().all(|c| c.is_ascii_digit()), "unexpected blob name: {body}");
    }

    #[test_log::test(tokio::test)]
    async fn test_upload_stores_wrapped_payload_and_returns_blob_name() {
        let server = MockServer::start().await;
        // Bucket-level requests carry a trailing slash in path style
        Mock::given(method("HEAD"))
            .and(path("/uploads/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex(r"^/uploads/\d{8}_\d{6}\.json$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let app = create_test_app(test_config(&server.uri(), "uploads"));
        let response = app.post("/upload").text("hello").await;

        response.assert_status_ok();
        let blob_name = response.text();
        assert_blob_name(&blob_name);

        let requests = server.received_requests().await.expect("request recording is enabled");
        let put = requests
            .iter()
            .find(|r| r.method.as_str() == "PUT" && r.url.path() != "/uploads/")
            .expect("no blob PUT recorded");
        assert_eq!(put.url.path(), format!("/uploads/{blob_name}"));
        assert_eq!(put.body, r#"{"message": "hello"}"#.as_bytes());
    }

    #[test_log::test(tokio::test)]
    async fn test_upload_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/uploads/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex(r"^/uploads/\d{8}_\d{6}\.json$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let app = create_test_app(test_config(&server.uri(), "uploads"));
        let response = app.post("/upload").text("").await;

        response.assert_status_ok();
        assert_blob_name(&response.text());

        let requests = server.received_requests().await.expect("request recording is enabled");
        let put = requests
            .iter()
            .find(|r| r.method.as_str() == "PUT" && r.url.path() != "/uploads/")
            .expect("no blob PUT recorded");
        assert_eq!(put.body, r#"{"message": ""}"#.as_bytes());
    }

    #[test_log::test(tokio::test)]
    async fn test_upload_accepts_non_utf8_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/uploads/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex(r"^/uploads/\d{8}_\d{6}\.json$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let app = create_test_app(test_config(&server.uri(), "uploads"));
        // 0xFF can never appear in well-formed UTF-8
        let response = app.post("/upload").bytes(Bytes::from_static(&[0xff])).await;

        response.assert_status_ok();
        assert_blob_name(&response.text());

        let requests = server.received_requests().await.expect("request recording is enabled");
        let put = requests
            .iter()
            .find(|r| r.method.as_str() == "PUT" && r.url.path() != "/uploads/")
            .expect("no blob PUT recorded");
        let expected = format!(r#"{{"message": "{}"}}"#, char::REPLACEMENT_CHARACTER);
        assert_eq!(put.body, expected.as_bytes());
    }

    #[test_log::test(tokio::test)]
    async fn test_upload_creates_missing_container_once() {
        let server = MockServer::start().await;
        // First existence check misses, every later one hits
        Mock::given(method("HEAD"))
            .and(path("/uploads/"))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/uploads/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/uploads/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex(r"^/uploads/\d{8}_\d{6}\.json$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let app = create_test_app(test_config(&server.uri(), "uploads"));
        app.post("/upload").text("first").await.assert_status_ok();
        app.post("/upload").text("second").await.assert_status_ok();

        // Exactly one container create, and it happened before any blob write
        let requests = server.received_requests().await.expect("request recording is enabled");
        let creates: Vec<usize> = requests
            .iter()
            .enumerate()
            .filter(|(_, r)| r.method.as_str() == "PUT" && r.url.path() == "/uploads/")
            .map(|(i, _)| i)
            .collect();
        let first_blob_write = requests
            .iter()
            .position(|r| r.method.as_str() == "PUT" && r.url.path() != "/uploads/")
            .expect("no blob PUT recorded");
        assert_eq!(creates.len(), 1);
        assert!(creates[0] < first_blob_write);
    }

    #[test_log::test(tokio::test)]
    async fn test_upload_answers_ok_when_container_vanishes_mid_flight() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/uploads/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let missing = ResponseTemplate::new(404).set_body_raw(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist</Message></Error>"#,
            "application/xml",
        );
        Mock::given(method("PUT"))
            .and(path_regex(r"^/uploads/\d{8}_\d{6}\.json$"))
            .respond_with(missing)
            .expect(1)
            .mount(&server)
            .await;

        let app = create_test_app(test_config(&server.uri(), "uploads"));
        let response = app.post("/upload").text("hello").await;

        // The caller still gets a blob name; the failure only shows up in logs
        response.assert_status_ok();
        assert_blob_name(&response.text());
    }

    #[test_log::test(tokio::test)]
    async fn test_upload_answers_ok_when_storage_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/uploads/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let app = create_test_app(test_config(&server.uri(), "uploads"));
        let response = app.post("/upload").text("hello").await;

        response.assert_status_ok();
        assert_blob_name(&response.text());
    }

    #[test_log::test(tokio::test)]
    async fn test_upload_answers_ok_without_storage_configuration() {
        let app = create_test_app(Config::default());

        let response = app.post("/upload").text("hello").await;

        response.assert_status_ok();
        assert_blob_name(&response.text());
    }
}
