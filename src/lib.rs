//! caac-bundle: export configuration products into a portable zip bundle and re-import it.

pub mod bundle;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metadata;
pub mod operation;
pub mod response;
pub mod routes;
pub mod state;
pub mod validation;

pub use bundle::{import_status, BundleImporter, BundlePackager, ImportReport, BUNDLE_FILE_NAME};
pub use catalog::{catalog, ContentLanguage, Product, ProductCatalog};
pub use config::{BasePathMode, ResourcesConfig};
pub use error::{AppError, BundleError, ConfigError, OperationFailure};
pub use metadata::{Application, ApplicationMetaData, RootMetadata, ROOT_METADATA_FILE};
pub use operation::{OperationHandler, OperationRegistry};
pub use routes::{bundle_routes, common_routes, common_routes_with_ready};
pub use state::AppState;
