//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `INLET_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `INLET_` override YAML values
//! 3. **STORAGE_ACCOUNT_NAME / STORAGE_CONTAINER_NAME** - Special case: these unprefixed
//!    variables are the conventional way to point the service at a storage account, and map
//!    onto `storage.account_name` / `storage.container_name`
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `INLET_STORAGE__REGION=eu-west-1` sets the `storage.region` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use inlet::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Parse CLI arguments
//! let args = Args::parse();
//!
//! // Load configuration from file and environment
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Structure
//!
//! ```yaml
//! host: "0.0.0.0"
//! port: 8080
//! enable_otel_export: false
//! storage:
//!   account_name: my-account
//!   container_name: uploads
//!   # endpoint: https://storage.example.com   # overrides the account-derived endpoint
//!   # region: auto
//!   # access_key_id: ...                      # omit both to use the ambient credential chain
//!   # secret_access_key: ...
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! INLET_PORT=8080
//!
//! # Point at a storage account (preferred method)
//! STORAGE_ACCOUNT_NAME=my-account
//! STORAGE_CONTAINER_NAME=uploads
//!
//! # Or use the prefixed nested form
//! INLET_STORAGE__ACCOUNT_NAME=my-account
//! INLET_STORAGE__CONTAINER_NAME=uploads
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "INLET_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Host address to bind the HTTP server to
    pub host: String,
    /// Port for the HTTP server to listen on
    pub port: u16,
    /// Export traces to an OTLP collector in addition to local logging
    pub enable_otel_export: bool,
    /// Blob storage connection settings
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_otel_export: false,
            storage: StorageConfig::default(),
        }
    }
}

/// Connection settings for the blob storage backend.
///
/// Uploads are attempted with whatever is configured here at the time of each
/// request. Missing settings do not prevent the server from starting; they
/// surface as logged upload failures instead.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Storage account the service endpoint is derived from
    pub account_name: Option<String>,
    /// Container that uploaded blobs are written into
    pub container_name: Option<String>,
    /// Explicit service endpoint, overriding the account-derived one
    pub endpoint: Option<Url>,
    /// Region passed to the SDK. Falls back to the ambient provider chain,
    /// then `us-east-1`
    pub region: Option<String>,
    /// Address blobs as `endpoint/container/key` rather than virtual-hosted style
    pub force_path_style: bool,
    /// Static credentials. Omit both to use the SDK's default credential chain
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_name: None,
            container_name: None,
            endpoint: None,
            region: None,
            force_path_style: true,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

impl StorageConfig {
    /// Whether enough is configured for an upload to be attempted.
    pub fn is_configured(&self) -> bool {
        self.account_name.is_some() && self.container_name.is_some()
    }

    /// Resolve the storage service endpoint.
    ///
    /// An explicit `endpoint` always wins. Otherwise the endpoint is derived
    /// from the account name. `None` means neither is available.
    pub fn endpoint_url(&self) -> Option<String> {
        if let Some(endpoint) = &self.endpoint {
            return Some(endpoint.as_str().trim_end_matches('/').to_string());
        }
        self.account_name
            .as_ref()
            .map(|account| format!("https://{account}.r2.cloudflarestorage.com"))
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), Error> {
        if self.storage.access_key_id.is_some() != self.storage.secret_access_key.is_some() {
            return Err(Error::NotConfigured {
                message: "storage.access_key_id and storage.secret_access_key must be set together".to_string(),
            });
        }
        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            // (INLET_CONFIG names the config file and is not a settings key)
            .merge(Env::prefixed("INLET_").ignore(&["CONFIG"]).split("__"))
            // Conventional unprefixed names for the storage account and container
            .merge(
                Env::raw()
                    .only(&["STORAGE_ACCOUNT_NAME", "STORAGE_CONTAINER_NAME"])
                    .map(|key| key.as_str().replacen("STORAGE_", "STORAGE__", 1).into())
                    .split("__"),
            )
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
