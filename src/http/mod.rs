//! HTTP surface: router, handlers, and request middleware.

pub mod docs;
pub mod hooks;
mod middleware;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};

use crate::auth::ViewerAuth;
use crate::docs::DocService;
use crate::docs::invalidation::InvalidationService;

pub use middleware::RequestContext;

#[derive(Clone)]
pub struct AppState {
    pub docs: Arc<DocService>,
    pub invalidation: Arc<InvalidationService>,
    pub auth: Arc<ViewerAuth>,
}

pub fn build_router(state: AppState) -> Router {
    // The documentation surface sits behind the viewer gate; webhook and
    // health endpoints stay open, since GitHub and probes call them.
    let gated = Router::new()
        .route("/", get(docs::index))
        .route("/docs/{owner}/{repository}", get(docs::rendered_doc))
        .route_layer(from_fn_with_state(state.clone(), middleware::viewer_auth));

    let open = Router::new()
        .route("/hooks/github", post(hooks::receive))
        .route("/_health", get(health));

    gated
        .merge(open)
        .with_state(state)
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
