//! Product catalog listing: the product types a caller can select for export.

use crate::catalog::{catalog, Product};
use crate::response::success_many;
use axum::response::IntoResponse;

/// GET /api/v1/products
pub async fn list_products() -> impl IntoResponse {
    let products: Vec<Product> = catalog().products().to_vec();
    tracing::debug!(count = products.len(), "listing products");
    success_many(products)
}
