//! Content validation: syntax validators keyed by language, and per-product validation.

pub mod content;
pub mod product;

pub use content::*;
pub use product::*;
