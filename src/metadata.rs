//! Bundle manifest types: the root manifest listing applications, and per-application metadata.

use crate::catalog::Product;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::path::Path;

/// Root manifest entry name inside every bundle.
pub const ROOT_METADATA_FILE: &str = "root_metadata.json";

/// Operation tag for moving a content file to its apply path.
pub const FILE_UPLOAD_OPERATION: &str = "FileUpload";

/// Ordered declaration of the applications a bundle carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootMetadata {
    /// Encoded as a string on the wire; integers are accepted on input.
    #[serde(
        rename = "noOfApplications",
        serialize_with = "count_as_string",
        deserialize_with = "count_from_string_or_int"
    )]
    pub application_count: usize,
    #[serde(default)]
    pub applications: Vec<Application>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "applicationName")]
    pub name: String,
    #[serde(rename = "executionSeq")]
    pub execution_sequence: usize,
    #[serde(rename = "applicationMetadataName")]
    pub metadata_file_name: String,
    /// Where the metadata came from at export time. Informational only.
    #[serde(rename = "applicationMetadataPath", default)]
    pub metadata_directory_path: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationMetaData {
    pub configuration_operation: String,
    pub configuration_file_name: String,
    pub configuration_apply_path: String,
}

impl ApplicationMetaData {
    /// Default metadata for a product: move its content file into `apply_path`.
    pub fn file_upload(product: &Product, apply_path: &Path) -> Self {
        ApplicationMetaData {
            configuration_operation: FILE_UPLOAD_OPERATION.to_string(),
            configuration_file_name: product.file_name.to_string(),
            configuration_apply_path: apply_path.to_string_lossy().into_owned(),
        }
    }

    /// Parse metadata text. `.yaml`/`.yml` names are read as YAML, everything else as JSON.
    pub fn parse(file_name: &str, text: &str) -> Result<Self, String> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(text).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(text).map_err(|e| e.to_string())
        }
    }
}

impl RootMetadata {
    /// One application per product, sequenced from 1 in iteration order.
    pub fn for_products<'a, I>(products: I, metadata_dir: &Path) -> Self
    where
        I: IntoIterator<Item = &'a Product>,
    {
        let metadata_directory_path = metadata_dir.to_string_lossy().into_owned();
        let applications: Vec<Application> = products
            .into_iter()
            .enumerate()
            .map(|(index, product)| {
                let app = Application {
                    name: product.display_name.to_string(),
                    execution_sequence: index + 1,
                    metadata_file_name: product.metadata_file_name.to_string(),
                    metadata_directory_path: metadata_directory_path.clone(),
                };
                tracing::debug!(application = ?app, "application");
                app
            })
            .collect();
        RootMetadata {
            application_count: applications.len(),
            applications,
        }
    }

    /// Index applications by sequence. Sequences below 1 and repeated sequences are rejected.
    pub fn index_by_sequence(&self) -> Result<HashMap<usize, &Application>, String> {
        let mut by_seq = HashMap::with_capacity(self.applications.len());
        for app in &self.applications {
            if app.execution_sequence == 0 {
                return Err(format!("application '{}' has execution sequence 0", app.name));
            }
            if by_seq.insert(app.execution_sequence, app).is_some() {
                return Err(format!(
                    "execution sequence {} is declared more than once",
                    app.execution_sequence
                ));
            }
        }
        Ok(by_seq)
    }

    /// Count matches the entries and sequences form exactly `1..=count`.
    pub fn is_contiguous(&self) -> bool {
        if self.application_count != self.applications.len() {
            return false;
        }
        match self.index_by_sequence() {
            Ok(by_seq) => (1..=self.application_count).all(|s| by_seq.contains_key(&s)),
            Err(_) => false,
        }
    }
}

fn count_as_string<S: Serializer>(count: &usize, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&count.to_string())
}

fn count_from_string_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Text(String),
        Number(usize),
    }
    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("noOfApplications is not a count: '{}'", s))),
    }
}
