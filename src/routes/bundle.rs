//! Bundle routes: export download, import upload (plain status or structured report), product listing.

use crate::handlers::{export_bundle, import_bundle, import_bundle_report, list_products};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

pub fn bundle_routes(state: AppState) -> Router {
    let max_upload = state.resources.max_upload_bytes;
    Router::new()
        .route("/convert-to-bundle", get(export_bundle))
        .route("/import", post(import_bundle))
        .route("/import/report", post(import_bundle_report))
        .route("/api/v1/products", get(list_products))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_upload)),
        )
        .with_state(state)
}
