//! Zip reading and writing for bundles.

use crate::error::BundleError;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Zip writer that flattens entries to their base name and never writes a name twice.
pub struct BundleWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    added: HashSet<String>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> BundleWriter<W> {
    pub fn new(inner: W) -> Self {
        BundleWriter {
            zip: ZipWriter::new(inner),
            added: HashSet::new(),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.added.contains(name)
    }

    /// Write one entry. Returns false (and writes nothing) if the name is already present.
    pub fn add_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<bool, BundleError> {
        if !self.added.insert(name.to_string()) {
            return Ok(false);
        }
        self.zip
            .start_file(name, self.options)
            .map_err(|e| BundleError::Packaging(format!("start entry {}: {}", name, e)))?;
        self.zip
            .write_all(bytes)
            .map_err(|e| BundleError::Packaging(format!("write entry {}: {}", name, e)))?;
        Ok(true)
    }

    /// Finish the central directory and hand back the inner writer.
    pub fn finish(self) -> Result<W, BundleError> {
        self.zip
            .finish()
            .map_err(|e| BundleError::Packaging(format!("finish archive: {}", e)))
    }
}

/// Extract every entry of `bytes` under `dest`. Entries that would land outside `dest` are rejected.
/// Extraction stops with an error once the decompressed total would exceed `max_total` bytes.
/// Returns the extracted file names relative to `dest`.
pub fn extract_to(bytes: &[u8], dest: &Path, max_total: u64) -> Result<Vec<String>, BundleError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| BundleError::Extraction(format!("invalid zip: {}", e)))?;

    let mut extracted = Vec::with_capacity(archive.len());
    let mut total: u64 = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| BundleError::Extraction(format!("entry {}: {}", i, e)))?;
        let relative = entry.enclosed_name().ok_or_else(|| {
            BundleError::Extraction(format!("entry '{}' escapes the working directory", entry.name()))
        })?;
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| write_error(&out_path, e))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
        }
        let mut out = fs::File::create(&out_path).map_err(|e| write_error(&out_path, e))?;
        // Declared sizes can lie; count what actually decompresses.
        let remaining = max_total - total;
        let written = io::copy(&mut (&mut entry).take(remaining.saturating_add(1)), &mut out)
            .map_err(|e| write_error(&out_path, e))?;
        if written > remaining {
            return Err(BundleError::Extraction(format!(
                "bundle expands beyond {} bytes at entry '{}'",
                max_total,
                relative.display()
            )));
        }
        total += written;
        tracing::debug!(entry = %relative.display(), "extracted");
        extracted.push(relative.to_string_lossy().into_owned());
    }
    Ok(extracted)
}

fn write_error(path: &Path, e: io::Error) -> BundleError {
    BundleError::Extraction(format!("{}: {}", path.display(), e))
}
