//! Bundle export (packaging) and import (extract, sequence, apply).

pub mod archive;
pub mod importer;
pub mod packager;

pub use importer::{import_status, AppliedApplication, BundleImporter, ImportReport};
pub use packager::BundlePackager;

/// Default archive name handed to callers of the export endpoint.
pub const BUNDLE_FILE_NAME: &str = "bundle.zip";
