//! Shared fixtures: a content/metadata tree on disk and zip helpers.

#![allow(dead_code)]

use caac_bundle::ResourcesConfig;
use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const API_JSON: &str = r#"{"routes":[{"path":"/orders","method":"GET"}]}"#;
pub const TENANT_YAML: &str = "name: acme\nregion: eu-west-1\n";

/// Temp tree with `content/`, `metadata/`, `out/`, `work/` and an `apply/` destination.
pub struct Fixture {
    pub root: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        for dir in ["content", "metadata", "out", "work", "apply"] {
            std::fs::create_dir_all(root.path().join(dir)).expect("mkdir");
        }
        Fixture { root }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    pub fn resources(&self) -> ResourcesConfig {
        ResourcesConfig::new(self.path("content"), self.path("metadata"))
            .with_output_dir(self.path("out"))
            .with_work_root(self.path("work"))
    }

    pub fn write_content(&self, name: &str, body: &str) {
        std::fs::write(self.path("content").join(name), body).expect("write content");
    }

    /// FileUpload metadata applying `file` under `apply/<sub>`.
    pub fn write_upload_metadata(&self, metadata_name: &str, file: &str, sub: &str) {
        let meta = serde_json::json!({
            "configurationOperation": "FileUpload",
            "configurationFileName": file,
            "configurationApplyPath": self.path("apply").join(sub).to_string_lossy(),
        });
        std::fs::write(self.path("metadata").join(metadata_name), meta.to_string()).expect("write metadata");
    }

    /// api.json + tenant.yaml with matching FileUpload metadata.
    pub fn with_api_and_tenant(self) -> Self {
        self.write_content("api.json", API_JSON);
        self.write_content("tenant.yaml", TENANT_YAML);
        self.write_upload_metadata("api_metadata.json", "api.json", "api");
        self.write_upload_metadata("tenant_metadata.json", "tenant.yaml", "tenants/acme");
        self
    }

    pub fn work_is_empty(&self) -> bool {
        std::fs::read_dir(self.path("work")).expect("read work").next().is_none()
    }
}

pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).expect("start");
        zip.write_all(body.as_bytes()).expect("write");
    }
    zip.finish().expect("finish").into_inner()
}

pub fn entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(bytes)).expect("zip");
    archive.file_names().map(String::from).collect()
}

pub fn read_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("zip");
    let mut file = archive.by_name(name).expect("entry");
    let mut s = String::new();
    std::io::Read::read_to_string(&mut file, &mut s).expect("read");
    s
}

pub fn unique(names: &[String]) -> bool {
    names.iter().collect::<BTreeSet<_>>().len() == names.len()
}

pub fn exists(path: &Path) -> bool {
    path.is_file()
}
