//! Per-product content validation: each product type is checked with its own language's validator.

use crate::catalog::{catalog, Product};
use crate::error::BundleError;
use crate::validation::content::validators;

/// Validate content for a product type.
pub fn validate_product(product: &Product, content: &str) -> Result<bool, BundleError> {
    let valid = validators().validate(content, product.language)?;
    tracing::info!(product = product.id, language = %product.language, valid, "validated configuration");
    Ok(valid)
}

/// Validate content for a product given by identifier (case-insensitive).
pub fn validate_configuration(identifier: &str, content: &str) -> Result<bool, BundleError> {
    validate_product(catalog().resolve(identifier)?, content)
}
