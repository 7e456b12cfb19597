//! Shared helpers for tests.
//!
//! Storage-backed tests run against a local mock server, so the config
//! produced here carries static credentials and an explicit region to keep
//! the SDK away from ambient credential and region lookups.

use crate::Application;
use crate::config::{Config, StorageConfig};

/// Config pointed at a local mock storage endpoint.
pub fn test_config(endpoint: &str, container: &str) -> Config {
    Config {
        storage: StorageConfig {
            account_name: Some("testaccount".to_string()),
            container_name: Some(container.to_string()),
            endpoint: Some(endpoint.parse().expect("invalid test endpoint")),
            region: Some("us-east-1".to_string()),
            force_path_style: true,
            access_key_id: Some("test-access-key".to_string()),
            secret_access_key: Some("test-secret-key".to_string()),
        },
        ..Config::default()
    }
}

/// Create a test server wrapping a full application.
pub fn create_test_app(config: Config) -> axum_test::TestServer {
    Application::new(config).expect("Failed to create application").into_test_server()
}
