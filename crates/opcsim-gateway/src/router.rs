//! Axum router construction for the gateway.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for cross-origin tooling access.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::GatewayState;

/// Build the complete Axum router for the gateway.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /api/endpoints` -- advertised endpoints
/// - `GET /api/nodes` -- browse `Objects`
/// - `GET /api/nodes/{id}/children` -- browse a folder
/// - `GET /api/nodes/{id}` -- read a node
/// - `PUT /api/nodes/{id}` -- write a variable
pub fn build_router(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/endpoints", get(handlers::list_endpoints))
        .route("/api/nodes", get(handlers::browse_objects))
        .route(
            "/api/nodes/{id}",
            get(handlers::read_node).put(handlers::write_node),
        )
        .route("/api/nodes/{id}/children", get(handlers::browse_children))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
