pub mod bundle;
pub mod common;

pub use bundle::bundle_routes;
pub use common::{common_routes, common_routes_with_ready};
