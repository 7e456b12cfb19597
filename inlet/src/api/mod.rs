//! API layer for HTTP request handling.
//!
//! # API Structure
//!
//! Two endpoints make up the whole surface:
//!
//! - **Health** (`/health`): Liveness check used by deployment probes
//! - **Uploads** (`/upload`): Accepts a payload and stores it as a timestamped blob
//!
//! # OpenAPI Documentation
//!
//! Both endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
