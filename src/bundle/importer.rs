//! Import: extract a bundle, walk its applications strictly by execution sequence and apply each.
//! Any failure aborts the whole import; the working directory is removed on every path.

use crate::bundle::archive::extract_to;
use crate::error::BundleError;
use crate::metadata::{Application, ApplicationMetaData, RootMetadata, ROOT_METADATA_FILE};
use crate::operation::OperationRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const IMPORT_SUCCESS: &str = "Imported successfully";
pub const IMPORT_FAILURE: &str = "Import unsuccessfully";

/// One application that was applied during an import.
#[derive(Clone, Debug, Serialize)]
pub struct AppliedApplication {
    pub sequence: usize,
    pub name: String,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ImportReport {
    pub applications: Vec<AppliedApplication>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Coarse status string for callers that only need success or failure.
pub fn import_status(result: &Result<ImportReport, BundleError>) -> &'static str {
    match result {
        Ok(_) => IMPORT_SUCCESS,
        Err(_) => IMPORT_FAILURE,
    }
}

/// Prefix of the per-import working directories created under the work root.
pub const WORK_DIR_PREFIX: &str = "caac-import-";

/// Default cap on the total bytes an import may extract.
pub const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 256 * 1024 * 1024;

pub struct BundleImporter {
    operations: OperationRegistry,
    work_root: PathBuf,
    max_extracted_bytes: u64,
}

impl BundleImporter {
    /// Importer with the default operations, creating working directories under `work_root`.
    pub fn new(work_root: impl Into<PathBuf>) -> Self {
        BundleImporter {
            operations: OperationRegistry::with_defaults(),
            work_root: work_root.into(),
            max_extracted_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
        }
    }

    pub fn with_max_extracted_bytes(mut self, max: u64) -> Self {
        self.max_extracted_bytes = max;
        self
    }

    pub fn with_operations(mut self, operations: OperationRegistry) -> Self {
        self.operations = operations;
        self
    }

    pub fn import_bundle(&self, bytes: &[u8]) -> Result<ImportReport, BundleError> {
        let started_at = Utc::now();
        fs::create_dir_all(&self.work_root)
            .map_err(|e| BundleError::Extraction(format!("create work root: {}", e)))?;
        let work = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(&self.work_root)
            .map_err(|e| BundleError::Extraction(format!("create working directory: {}", e)))?;
        tracing::info!(path = %work.path().display(), "extracting bundle");

        let result = self.import_in(bytes, work.path());
        match &result {
            Ok(applied) => tracing::info!(applications = applied.len(), "bundle imported"),
            Err(e) => tracing::warn!(error = %e, structural = e.is_structural(), "bundle import failed"),
        }
        if let Err(e) = work.close() {
            tracing::warn!(error = %e, "failed to remove working directory");
        }

        Ok(ImportReport {
            applications: result?,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn import_in(&self, bytes: &[u8], work_dir: &Path) -> Result<Vec<AppliedApplication>, BundleError> {
        extract_to(bytes, work_dir, self.max_extracted_bytes)?;
        let root = load_root_metadata(work_dir)?;
        let by_sequence = root.index_by_sequence().map_err(BundleError::Manifest)?;

        let declared = root.application_count;
        let mut applied = Vec::with_capacity(declared);
        for sequence in 1..=declared {
            let app = by_sequence.get(&sequence).ok_or_else(|| {
                tracing::warn!(sequence, "no application found for sequence");
                BundleError::SequenceGap { sequence, declared }
            })?;
            applied.push(self.apply_application(sequence, app, work_dir)?);
        }
        Ok(applied)
    }

    fn apply_application(
        &self,
        sequence: usize,
        app: &Application,
        work_dir: &Path,
    ) -> Result<AppliedApplication, BundleError> {
        let metadata_error = |reason: String| BundleError::MetadataLoad {
            sequence,
            file: app.metadata_file_name.clone(),
            reason,
        };
        let path = resolve_inside(work_dir, &app.metadata_file_name)
            .ok_or_else(|| metadata_error("path escapes the working directory".into()))?;
        let text = fs::read_to_string(&path).map_err(|e| metadata_error(e.to_string()))?;
        let metadata = ApplicationMetaData::parse(&app.metadata_file_name, &text).map_err(metadata_error)?;
        tracing::info!(sequence, application = %app.name, metadata = %path.display(), "processing application");

        let destination = self
            .operations
            .handler_for(&metadata.configuration_operation)
            .apply(&metadata, work_dir)
            .map_err(|source| BundleError::Operation {
                sequence,
                operation: metadata.configuration_operation.clone(),
                source,
            })?;

        Ok(AppliedApplication {
            sequence,
            name: app.name.clone(),
            operation: metadata.configuration_operation,
            destination,
        })
    }
}

fn load_root_metadata(work_dir: &Path) -> Result<RootMetadata, BundleError> {
    let path = work_dir.join(ROOT_METADATA_FILE);
    let text = fs::read_to_string(&path)
        .map_err(|e| BundleError::Manifest(format!("{}: {}", ROOT_METADATA_FILE, e)))?;
    serde_json::from_str(&text).map_err(|e| BundleError::Manifest(format!("invalid {}: {}", ROOT_METADATA_FILE, e)))
}

/// Join a relative name onto `base`, refusing absolute paths and `..`.
fn resolve_inside(base: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    let safe = !name.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    safe.then(|| base.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperationFailure;
    use crate::operation::OperationHandler;
    use std::io::{Cursor, Write};
    use std::sync::{Arc, Mutex};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Records every file name it is asked to apply.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl OperationHandler for Recorder {
        fn apply(&self, metadata: &ApplicationMetaData, _: &Path) -> Result<Option<PathBuf>, OperationFailure> {
            self.seen.lock().unwrap().push(metadata.configuration_file_name.clone());
            if self.fail_on.as_deref() == Some(metadata.configuration_file_name.as_str()) {
                return Err(OperationFailure::SourceMissing(PathBuf::from(&metadata.configuration_file_name)));
            }
            Ok(None)
        }
    }

    fn importer_with(recorder: Arc<Recorder>, root: &Path) -> BundleImporter {
        let mut ops = OperationRegistry::empty();
        ops.register("Record", recorder);
        BundleImporter::new(root).with_operations(ops)
    }

    fn app(seq: usize) -> serde_json::Value {
        serde_json::json!({
            "applicationName": format!("app{}", seq),
            "executionSeq": seq,
            "applicationMetadataName": format!("app{}_metadata.json", seq),
            "applicationMetadataPath": "/meta"
        })
    }

    fn bundle(count: &str, seqs: &[usize]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let root = serde_json::json!({
            "noOfApplications": count,
            "applications": seqs.iter().map(|s| app(*s)).collect::<Vec<_>>()
        });
        zip.start_file(ROOT_METADATA_FILE, SimpleFileOptions::default()).unwrap();
        zip.write_all(root.to_string().as_bytes()).unwrap();
        for s in seqs {
            let meta = serde_json::json!({
                "configurationOperation": "Record",
                "configurationFileName": format!("file{}", s),
                "configurationApplyPath": "/unused"
            });
            zip.start_file(format!("app{}_metadata.json", s), SimpleFileOptions::default()).unwrap();
            zip.write_all(meta.to_string().as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn work_root_is_empty(root: &Path) -> bool {
        fs::read_dir(root).unwrap().next().is_none()
    }

    #[test]
    fn applies_in_sequence_order_regardless_of_listing_order() {
        let root = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let report = importer_with(recorder.clone(), root.path())
            .import_bundle(&bundle("3", &[3, 1, 2]))
            .unwrap();
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["file1", "file2", "file3"]);
        assert_eq!(report.applications.iter().map(|a| a.sequence).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(work_root_is_empty(root.path()));
    }

    #[test]
    fn gap_stops_before_missing_sequence() {
        let root = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let err = importer_with(recorder.clone(), root.path())
            .import_bundle(&bundle("3", &[1, 2]))
            .unwrap_err();
        assert!(matches!(err, BundleError::SequenceGap { sequence: 3, declared: 3 }));
        assert_eq!(recorder.seen.lock().unwrap().len(), 2);
        assert!(work_root_is_empty(root.path()));
    }

    #[test]
    fn handler_failure_aborts_remaining_sequences() {
        let root = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder {
            fail_on: Some("file2".into()),
            ..Default::default()
        });
        let err = importer_with(recorder.clone(), root.path())
            .import_bundle(&bundle("3", &[1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, BundleError::Operation { sequence: 2, .. }));
        assert!(!err.is_structural());
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["file1", "file2"]);
    }

    #[test]
    fn duplicate_sequence_is_a_manifest_error() {
        let root = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let err = importer_with(recorder.clone(), root.path())
            .import_bundle(&bundle("2", &[1, 1]))
            .unwrap_err();
        assert!(matches!(err, BundleError::Manifest(_)));
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn oversized_bundle_fails_extraction_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let err = importer_with(recorder.clone(), root.path())
            .with_max_extracted_bytes(16)
            .import_bundle(&bundle("1", &[1]))
            .unwrap_err();
        assert!(matches!(err, BundleError::Extraction(_)));
        assert!(recorder.seen.lock().unwrap().is_empty());
        assert!(work_root_is_empty(root.path()));
    }

    #[test]
    fn working_directory_lives_under_work_root() {
        let root = tempfile::tempdir().unwrap();
        let work_root = root.path().join("not-yet-created");
        let recorder = Arc::new(Recorder::default());
        importer_with(recorder, &work_root).import_bundle(&bundle("1", &[1])).unwrap();
        assert!(work_root.is_dir());
        assert!(work_root_is_empty(&work_root));
    }

    #[test]
    fn escaping_metadata_name_is_rejected() {
        assert!(resolve_inside(Path::new("/w"), "../etc/passwd").is_none());
        assert!(resolve_inside(Path::new("/w"), "/etc/passwd").is_none());
        assert!(resolve_inside(Path::new("/w"), "").is_none());
        assert_eq!(resolve_inside(Path::new("/w"), "a.json"), Some(PathBuf::from("/w/a.json")));
    }

    #[test]
    fn status_strings() {
        let ok: Result<ImportReport, BundleError> = Ok(ImportReport {
            applications: vec![],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        });
        assert_eq!(import_status(&ok), "Imported successfully");
        assert_eq!(import_status(&Err(BundleError::Manifest("x".into()))), "Import unsuccessfully");
    }
}
