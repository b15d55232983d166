//! HTTP handlers for bundle export/import and the product catalog.

pub mod bundle;
pub mod catalog;
pub use bundle::*;
pub use catalog::*;
