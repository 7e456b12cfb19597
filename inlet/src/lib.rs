//! # inlet: Payload Intake Service
//!
//! `inlet` is a small HTTP service that accepts posted payloads and stores each one in blob
//! storage as a timestamped JSON document. It exposes two endpoints: a liveness check at
//! `/health` and the intake endpoint at `/upload`.
//!
//! ## Overview
//!
//! `inlet` sits at the edge of a pipeline whose producers must never block on storage. A
//! producer POSTs a raw payload to `/upload`; the service wraps it in a one-field JSON
//! envelope (`{"message": ...}`) and writes it to the configured container under a name
//! derived from the current UTC wall-clock time (`yyyyMMdd_HHmmss.json`). The response is
//! always `200` with the blob name, whether or not the write succeeded: producers are
//! decoupled from storage health, and failures are reported through the service logs
//! instead of the HTTP response.
//!
//! A fresh storage client is built for every upload, so credential rotation and
//! configuration changes take effect without a restart. The target container is created
//! automatically the first time it is found missing.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use inlet::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = inlet::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize telemetry (structured logging and optional OpenTelemetry)
//!     inlet::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     // Create and start the application
//!     let app = Application::new(config)?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod errors;
mod openapi;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::openapi::ApiDoc;
pub use config::Config;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}

/// Build the application router with all endpoints and middleware.
///
/// This wires up the two service endpoints, the interactive API docs at
/// `/docs`, and a tracing layer that logs every request and response.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::handlers::health::health))
        .route("/upload", post(api::handlers::uploads::upload))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns the router and configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] checks the configuration and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests drain and
///    telemetry is flushed
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance.
    ///
    /// Missing storage settings are logged as a warning rather than refusing to
    /// start: `/health` must keep answering even while storage is unusable.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        if !config.storage.is_configured() {
            warn!(
                "Storage is not fully configured (set STORAGE_ACCOUNT_NAME and STORAGE_CONTAINER_NAME); \
                 uploads will be accepted but nothing will be stored"
            );
        }

        let state = AppState { config: config.clone() };
        let router = build_router(state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Inlet listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        // Shutdown telemetry
        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
