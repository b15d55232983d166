//! Operation handlers: what an application's metadata asks the importer to do.

use crate::catalog::catalog;
use crate::error::OperationFailure;
use crate::metadata::{ApplicationMetaData, FILE_UPLOAD_OPERATION};
use crate::validation::validate_product;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub trait OperationHandler: Send + Sync {
    /// Apply one application's metadata. Returns the path it wrote, if any.
    fn apply(
        &self,
        metadata: &ApplicationMetaData,
        working_dir: &Path,
    ) -> Result<Option<PathBuf>, OperationFailure>;
}

/// Moves the content file from the working directory to `configurationApplyPath`.
/// Content belonging to a catalog product is syntax-checked before the move.
pub struct FileUploadHandler;

impl OperationHandler for FileUploadHandler {
    fn apply(
        &self,
        metadata: &ApplicationMetaData,
        working_dir: &Path,
    ) -> Result<Option<PathBuf>, OperationFailure> {
        let file_name = bare_file_name(&metadata.configuration_file_name)?;
        let apply_path = metadata.configuration_apply_path.trim();
        if apply_path.is_empty() {
            return Err(OperationFailure::MissingApplyPath(file_name.to_string()));
        }
        let source = working_dir.join(file_name);
        if !source.is_file() {
            return Err(OperationFailure::SourceMissing(source));
        }

        if let Some(product) = catalog().find_by_file_name(file_name) {
            let content = fs::read_to_string(&source)?;
            let valid = validate_product(product, &content).unwrap_or(false);
            if !valid {
                return Err(OperationFailure::InvalidContent {
                    file: file_name.to_string(),
                    language: product.language.to_string(),
                });
            }
        }

        let dest_dir = PathBuf::from(apply_path);
        fs::create_dir_all(&dest_dir)?;
        let destination = dest_dir.join(file_name);
        move_file(&source, &destination)?;
        tracing::info!(destination = %destination.display(), "file moved");
        Ok(Some(destination))
    }
}

/// Accepts anything and does nothing. Used for operation tags this build does not know.
pub struct NoOpHandler;

impl OperationHandler for NoOpHandler {
    fn apply(&self, _: &ApplicationMetaData, _: &Path) -> Result<Option<PathBuf>, OperationFailure> {
        Ok(None)
    }
}

/// Handlers by operation tag (case-insensitive). Unknown tags resolve to [`NoOpHandler`].
#[derive(Clone)]
pub struct OperationRegistry {
    handlers: HashMap<String, Arc<dyn OperationHandler>>,
    fallback: Arc<dyn OperationHandler>,
}

impl OperationRegistry {
    pub fn empty() -> Self {
        OperationRegistry {
            handlers: HashMap::new(),
            fallback: Arc::new(NoOpHandler),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(FILE_UPLOAD_OPERATION, Arc::new(FileUploadHandler));
        registry
    }

    /// Register (or replace) the handler for an operation tag.
    pub fn register(&mut self, operation: &str, handler: Arc<dyn OperationHandler>) {
        self.handlers.insert(operation.to_lowercase(), handler);
    }

    pub fn is_known(&self, operation: &str) -> bool {
        self.handlers.contains_key(&operation.to_lowercase())
    }

    pub fn handler_for(&self, operation: &str) -> &dyn OperationHandler {
        match self.handlers.get(&operation.to_lowercase()) {
            Some(h) => h.as_ref(),
            None => {
                tracing::info!(operation, "unknown operation, skipping");
                self.fallback.as_ref()
            }
        }
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn bare_file_name(name: &str) -> Result<&str, OperationFailure> {
    let path = Path::new(name);
    match path.file_name() {
        Some(base) if base == path.as_os_str() && base != ".." => Ok(name),
        _ => Err(OperationFailure::InvalidFileName(name.to_string())),
    }
}

/// Rename, replacing the destination. Falls back to copy + remove across filesystems.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(error = %e, "rename across devices, copying");
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(file: &str, apply: &Path) -> ApplicationMetaData {
        ApplicationMetaData {
            configuration_operation: "fileupload".into(),
            configuration_file_name: file.into(),
            configuration_apply_path: apply.to_string_lossy().into_owned(),
        }
    }

    #[test]
    fn file_upload_moves_and_overwrites() {
        let work = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let dest_dir = target.path().join("nested/dir");
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(dest_dir.join("notes.txt"), "old").unwrap();
        fs::write(work.path().join("notes.txt"), "new").unwrap();

        let registry = OperationRegistry::with_defaults();
        let meta = upload("notes.txt", &dest_dir);
        let written = registry
            .handler_for(&meta.configuration_operation)
            .apply(&meta, work.path())
            .unwrap();

        assert_eq!(written, Some(dest_dir.join("notes.txt")));
        assert_eq!(fs::read_to_string(dest_dir.join("notes.txt")).unwrap(), "new");
        assert!(!work.path().join("notes.txt").exists());
    }

    #[test]
    fn file_upload_creates_destination_dirs() {
        let work = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        fs::write(work.path().join("tenant.yaml"), "name: acme\n").unwrap();
        let dest = target.path().join("a/b/c");
        FileUploadHandler.apply(&upload("tenant.yaml", &dest), work.path()).unwrap();
        assert!(dest.join("tenant.yaml").is_file());
    }

    #[test]
    fn file_upload_missing_source_fails() {
        let work = tempfile::tempdir().unwrap();
        let err = FileUploadHandler
            .apply(&upload("api.json", work.path()), work.path())
            .unwrap_err();
        assert!(matches!(err, OperationFailure::SourceMissing(_)));
    }

    #[test]
    fn file_upload_rejects_invalid_product_content() {
        let work = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        fs::write(work.path().join("api.json"), "{not json").unwrap();
        let err = FileUploadHandler
            .apply(&upload("api.json", target.path()), work.path())
            .unwrap_err();
        assert!(matches!(err, OperationFailure::InvalidContent { .. }));
        assert!(!target.path().join("api.json").exists());
    }

    #[test]
    fn file_upload_rejects_paths() {
        let work = tempfile::tempdir().unwrap();
        for name in ["../escape.json", "dir/api.json", ".."] {
            let err = FileUploadHandler.apply(&upload(name, work.path()), work.path()).unwrap_err();
            assert!(matches!(err, OperationFailure::InvalidFileName(_)), "{}", name);
        }
    }

    #[test]
    fn file_upload_requires_apply_path() {
        let work = tempfile::tempdir().unwrap();
        fs::write(work.path().join("notes.txt"), "x").unwrap();
        for apply in ["", "   "] {
            let meta = ApplicationMetaData {
                configuration_operation: "FileUpload".into(),
                configuration_file_name: "notes.txt".into(),
                configuration_apply_path: apply.into(),
            };
            let err = FileUploadHandler.apply(&meta, work.path()).unwrap_err();
            assert!(matches!(err, OperationFailure::MissingApplyPath(_)), "{:?}", apply);
        }
        assert!(work.path().join("notes.txt").is_file());
    }

    #[test]
    fn unknown_operation_is_noop() {
        let registry = OperationRegistry::with_defaults();
        assert!(registry.is_known("FILEUPLOAD"));
        assert!(!registry.is_known("DatabaseMigrate"));
        let meta = ApplicationMetaData {
            configuration_operation: "DatabaseMigrate".into(),
            configuration_file_name: "missing.sql".into(),
            configuration_apply_path: String::new(),
        };
        let out = registry.handler_for("DatabaseMigrate").apply(&meta, Path::new("/nonexistent")).unwrap();
        assert!(out.is_none());
    }
}
