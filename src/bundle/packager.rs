//! Export: package selected products' content and metadata files plus a root manifest into a zip.

use crate::bundle::archive::BundleWriter;
use crate::catalog::{ProductCatalog, Product};
use crate::config::ResourcesConfig;
use crate::error::BundleError;
use crate::metadata::{ApplicationMetaData, RootMetadata, ROOT_METADATA_FILE};
use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

pub struct BundlePackager<'a> {
    catalog: &'a ProductCatalog,
    content_dir: PathBuf,
    metadata_dir: PathBuf,
    output_dir: PathBuf,
}

impl<'a> BundlePackager<'a> {
    pub fn new(catalog: &'a ProductCatalog, resources: &ResourcesConfig) -> Self {
        BundlePackager {
            catalog,
            content_dir: resources.content_dir.clone(),
            metadata_dir: resources.metadata_dir.clone(),
            output_dir: resources.output_dir.clone(),
        }
    }

    /// Write `archive_name` into the output directory and return its path.
    /// Missing content or metadata files are skipped; a failure to write the archive is an error
    /// and may leave a partial file behind.
    pub fn package<I, S>(&self, identifiers: I, archive_name: &str) -> Result<PathBuf, BundleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let products = self.catalog.resolve_all(identifiers)?;
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| BundleError::Packaging(format!("{}: {}", self.output_dir.display(), e)))?;
        let zip_path = self.output_dir.join(archive_name);
        tracing::info!(archive = %zip_path.display(), products = products.len(), "creating bundle");

        let file = fs::File::create(&zip_path)
            .map_err(|e| BundleError::Packaging(format!("{}: {}", zip_path.display(), e)))?;
        let added = self.package_products(&products, file)?;
        tracing::info!(archive = %zip_path.display(), files = ?added, "bundle created");
        Ok(zip_path)
    }

    /// Package into any seekable writer. Returns the entry names written.
    pub fn package_to_writer<I, S, W>(&self, identifiers: I, writer: W) -> Result<Vec<String>, BundleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        W: Write + Seek,
    {
        let products = self.catalog.resolve_all(identifiers)?;
        self.package_products(&products, writer)
    }

    fn package_products<W: Write + Seek>(
        &self,
        products: &[&Product],
        writer: W,
    ) -> Result<Vec<String>, BundleError> {
        let mut bundle = BundleWriter::new(writer);
        let mut added = Vec::new();
        for product in products {
            for (dir, name) in [
                (&self.content_dir, product.file_name),
                (&self.metadata_dir, product.metadata_file_name),
            ] {
                if let Some(entry) = add_file(&mut bundle, dir, name)? {
                    added.push(entry);
                }
            }
        }

        let root = RootMetadata::for_products(products.iter().copied(), &self.metadata_dir);
        let root_json = serde_json::to_vec_pretty(&root)
            .map_err(|e| BundleError::Packaging(format!("serialize root manifest: {}", e)))?;
        if bundle.add_bytes(ROOT_METADATA_FILE, &root_json)? {
            added.push(ROOT_METADATA_FILE.to_string());
        }
        bundle.finish()?;
        Ok(added)
    }

    /// Write a default FileUpload metadata file for every selected product that has none.
    /// Existing metadata files are left untouched. Returns the files written.
    pub fn seed_metadata<I, S>(&self, identifiers: I, apply_path: &Path) -> Result<Vec<PathBuf>, BundleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let products = self.catalog.resolve_all(identifiers)?;
        let mut written = Vec::new();
        for product in products {
            let path = self.metadata_dir.join(product.metadata_file_name);
            if path.exists() {
                continue;
            }
            fs::create_dir_all(&self.metadata_dir)
                .map_err(|e| BundleError::Packaging(format!("{}: {}", self.metadata_dir.display(), e)))?;
            let metadata = ApplicationMetaData::file_upload(product, apply_path);
            let json = serde_json::to_vec_pretty(&metadata)
                .map_err(|e| BundleError::Packaging(format!("serialize metadata: {}", e)))?;
            fs::write(&path, json).map_err(|e| BundleError::Packaging(format!("{}: {}", path.display(), e)))?;
            tracing::info!(product = product.id, path = %path.display(), "seeded application metadata");
            written.push(path);
        }
        Ok(written)
    }
}

fn add_file<W: Write + Seek>(
    bundle: &mut BundleWriter<W>,
    dir: &Path,
    name: &str,
) -> Result<Option<String>, BundleError> {
    let path = dir.join(name);
    if !path.is_file() {
        tracing::warn!(path = %path.display(), "file not found, skipping");
        return Ok(None);
    }
    let entry = match path.file_name() {
        Some(n) => n.to_string_lossy().into_owned(),
        None => return Ok(None),
    };
    if bundle.contains(&entry) {
        tracing::warn!(entry = %entry, path = %path.display(), "entry already in bundle, skipping");
        return Ok(None);
    }
    let bytes = fs::read(&path).map_err(|e| BundleError::Packaging(format!("{}: {}", path.display(), e)))?;
    bundle.add_bytes(&entry, &bytes)?;
    tracing::info!(path = %path.display(), "file added to bundle");
    Ok(Some(entry))
}
