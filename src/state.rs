//! Shared application state for all routes.

use crate::config::ResourcesConfig;
use crate::operation::OperationRegistry;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub resources: Arc<ResourcesConfig>,
    pub operations: OperationRegistry,
    /// Held for the duration of an import; imports touching the same apply paths must not interleave.
    pub import_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(resources: ResourcesConfig) -> Self {
        AppState {
            resources: Arc::new(resources),
            operations: OperationRegistry::with_defaults(),
            import_lock: Arc::new(Mutex::new(())),
        }
    }
}
