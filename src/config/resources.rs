//! Resource directories for bundles, resolved from environment settings.
//!
//! `CAAC_RESOURCE_BASEPATH` selects how `CAAC_RESOURCE_DIRECTORY` and `CAAC_RESOURCE_METADATA`
//! are resolved: `home` joins them onto the user's home directory, `project` uses them as given
//! (relative to the process working directory). Any other value is a startup error.

use crate::bundle::importer::DEFAULT_MAX_EXTRACTED_BYTES;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BASE_PATH: &str = "CAAC_RESOURCE_BASEPATH";
pub const ENV_RESOURCE_DIRECTORY: &str = "CAAC_RESOURCE_DIRECTORY";
pub const ENV_METADATA_DIRECTORY: &str = "CAAC_RESOURCE_METADATA";
pub const ENV_OUTPUT_DIRECTORY: &str = "CAAC_BUNDLE_OUTPUT_DIR";
pub const ENV_WORK_DIRECTORY: &str = "CAAC_WORK_DIR";
pub const ENV_DEFAULT_APPLY_PATH: &str = "CAAC_DEFAULT_APPLY_PATH";
pub const ENV_OPERATION_TIMEOUT: &str = "CAAC_OPERATION_TIMEOUT_SECS";
pub const ENV_MAX_UPLOAD_BYTES: &str = "CAAC_MAX_UPLOAD_BYTES";
pub const ENV_MAX_EXTRACTED_BYTES: &str = "CAAC_MAX_EXTRACTED_BYTES";

const DEFAULT_RESOURCE_DIRECTORY: &str = "resources/configurations";
const DEFAULT_METADATA_DIRECTORY: &str = "resources/metadata";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// How configured directories are anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BasePathMode {
    /// Relative to the user's home directory.
    Home,
    /// Relative to the process working directory.
    Project,
}

impl std::str::FromStr for BasePathMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "home" => Ok(BasePathMode::Home),
            "project" => Ok(BasePathMode::Project),
            _ => Err(ConfigError::InvalidBasePath(s.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResourcesConfig {
    /// Content files live here; exported bundles are written here unless an output directory is set.
    pub content_dir: PathBuf,
    pub metadata_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Parent of per-import working directories.
    pub work_root: PathBuf,
    /// When set, export writes a default FileUpload metadata file for products lacking one.
    pub default_apply_path: Option<PathBuf>,
    pub operation_timeout: Option<Duration>,
    pub max_upload_bytes: usize,
    /// Cap on the decompressed size of one imported bundle.
    pub max_extracted_bytes: u64,
}

impl ResourcesConfig {
    /// Plain directories, no environment involved.
    pub fn new(content_dir: impl Into<PathBuf>, metadata_dir: impl Into<PathBuf>) -> Self {
        let content_dir = content_dir.into();
        ResourcesConfig {
            output_dir: content_dir.clone(),
            content_dir,
            metadata_dir: metadata_dir.into(),
            work_root: std::env::temp_dir(),
            default_apply_path: None,
            operation_timeout: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_extracted_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), dirs::home_dir())
    }

    /// Build from a key lookup. `home` is only consulted in [`BasePathMode::Home`].
    pub fn from_lookup<F>(lookup: F, home: Option<PathBuf>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mode: BasePathMode = get(ENV_BASE_PATH).unwrap_or_else(|| "project".into()).parse()?;
        let anchor = |relative: String| -> Result<PathBuf, ConfigError> {
            match mode {
                BasePathMode::Home => {
                    let home = home.clone().ok_or(ConfigError::MissingHomeDirectory)?;
                    Ok(home.join(relative))
                }
                BasePathMode::Project => Ok(PathBuf::from(relative)),
            }
        };

        let content_dir =
            anchor(get(ENV_RESOURCE_DIRECTORY).unwrap_or_else(|| DEFAULT_RESOURCE_DIRECTORY.into()))?;
        let metadata_dir =
            anchor(get(ENV_METADATA_DIRECTORY).unwrap_or_else(|| DEFAULT_METADATA_DIRECTORY.into()))?;
        let output_dir = get(ENV_OUTPUT_DIRECTORY)
            .map(PathBuf::from)
            .unwrap_or_else(|| content_dir.clone());
        let work_root = get(ENV_WORK_DIRECTORY)
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let default_apply_path = get(ENV_DEFAULT_APPLY_PATH).map(PathBuf::from);
        let operation_timeout = get(ENV_OPERATION_TIMEOUT)
            .map(|v| parse_number::<u64>(ENV_OPERATION_TIMEOUT, &v))
            .transpose()?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let max_upload_bytes = get(ENV_MAX_UPLOAD_BYTES)
            .map(|v| parse_number::<usize>(ENV_MAX_UPLOAD_BYTES, &v))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        let max_extracted_bytes = get(ENV_MAX_EXTRACTED_BYTES)
            .map(|v| parse_number::<u64>(ENV_MAX_EXTRACTED_BYTES, &v))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_EXTRACTED_BYTES);

        Ok(ResourcesConfig {
            content_dir,
            metadata_dir,
            output_dir,
            work_root,
            default_apply_path,
            operation_timeout,
            max_upload_bytes,
            max_extracted_bytes,
        })
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_work_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_root = dir.into();
        self
    }

    pub fn with_default_apply_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_apply_path = Some(dir.into());
        self
    }

    pub fn log_resource_paths(&self) {
        tracing::info!(path = %display_absolute(&self.content_dir), "content directory");
        tracing::info!(path = %display_absolute(&self.metadata_dir), "metadata directory");
        tracing::info!(path = %display_absolute(&self.output_dir), "bundle output directory");
        tracing::info!(path = %display_absolute(&self.work_root), "import work root");
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        message: format!("'{}' is not a non-negative integer", value),
    })
}

fn display_absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn project_mode_keeps_relative_paths() {
        let cfg = ResourcesConfig::from_lookup(
            lookup(&[
                (ENV_BASE_PATH, "Project"),
                (ENV_RESOURCE_DIRECTORY, "conf"),
                (ENV_METADATA_DIRECTORY, "meta"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(cfg.content_dir, PathBuf::from("conf"));
        assert_eq!(cfg.metadata_dir, PathBuf::from("meta"));
        assert_eq!(cfg.output_dir, PathBuf::from("conf"));
        assert!(cfg.operation_timeout.is_none());
    }

    #[test]
    fn home_mode_anchors_on_home() {
        let cfg = ResourcesConfig::from_lookup(
            lookup(&[(ENV_BASE_PATH, "home"), (ENV_RESOURCE_DIRECTORY, "conf")]),
            Some(PathBuf::from("/home/op")),
        )
        .unwrap();
        assert_eq!(cfg.content_dir, PathBuf::from("/home/op/conf"));
        assert_eq!(cfg.metadata_dir, PathBuf::from("/home/op").join(DEFAULT_METADATA_DIRECTORY));
    }

    #[test]
    fn home_mode_without_home_fails() {
        let err = ResourcesConfig::from_lookup(lookup(&[(ENV_BASE_PATH, "home")]), None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingHomeDirectory));
    }

    #[test]
    fn unknown_base_mode_is_rejected() {
        let err = ResourcesConfig::from_lookup(lookup(&[(ENV_BASE_PATH, "cloud")]), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBasePath(ref v) if v == "cloud"));
    }

    #[test]
    fn numeric_settings() {
        let cfg = ResourcesConfig::from_lookup(
            lookup(&[
                (ENV_OPERATION_TIMEOUT, "30"),
                (ENV_MAX_UPLOAD_BYTES, "1024"),
                (ENV_MAX_EXTRACTED_BYTES, "4096"),
            ]),
            None,
        )
        .unwrap();
        assert_eq!(cfg.operation_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.max_upload_bytes, 1024);
        assert_eq!(cfg.max_extracted_bytes, 4096);
        let defaults = ResourcesConfig::from_lookup(lookup(&[]), None).unwrap();
        assert_eq!(defaults.max_extracted_bytes, DEFAULT_MAX_EXTRACTED_BYTES);
        assert!(ResourcesConfig::from_lookup(lookup(&[(ENV_OPERATION_TIMEOUT, "soon")]), None).is_err());
    }
}
