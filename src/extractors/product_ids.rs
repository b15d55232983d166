//! Extract the product identifiers selected for export from the `ids` query parameter.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

/// Query parameter carrying product identifiers. Repeated (`ids=api&ids=tenant`) or comma-separated.
pub const PRODUCT_IDS_PARAM: &str = "ids";

/// Non-empty list of product identifiers in request order.
#[derive(Clone, Debug)]
pub struct ProductIds(pub Vec<String>);

#[async_trait]
impl<S> FromRequestParts<S> for ProductIds
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let ids = parse_ids(&pairs);
        if ids.is_empty() {
            return Err(AppError::BadRequest(format!(
                "'{}' query parameter is required",
                PRODUCT_IDS_PARAM
            )));
        }
        Ok(ProductIds(ids))
    }
}

fn parse_ids(pairs: &[(String, String)]) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, _)| k == PRODUCT_IDS_PARAM)
        .flat_map(|(_, v)| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
