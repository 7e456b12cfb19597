//! OpenAPI documentation configuration.
//!
//! The generated spec covers the whole HTTP surface and is served by the
//! interactive docs page mounted at `/docs`.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    paths(api::handlers::health::health, api::handlers::uploads::upload),
    tags(
        (name = "service", description = "Payload intake and liveness endpoints")
    ),
    info(
        title = "Inlet API",
        version = "1.0.0",
        description = "Accepts posted payloads and stores each one as a timestamped JSON blob.

The `/upload` endpoint always answers with the generated blob name; storage problems are
reported through the service logs rather than the HTTP response."
    )
)]
pub struct ApiDoc;
