use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use axum::Router;
use blobd_store::BlobStore;
use tower_http::trace::TraceLayer;

use crate::handler;

/// Build the axum router with all blobd endpoints.
///
/// Upload size is bounded by the declared `Content-Length`, not by a
/// framework body limit.
pub fn build_router(store: BlobStore) -> Router {
    Router::new()
        .route("/upload/:name", put(handler::upload))
        .route("/download/:name", get(handler::download))
        .route("/list", get(handler::list))
        .route("/list/", get(handler::list))
        .route("/health", get(handler::health))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
