//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for resource base path: '{0}' (expected home or project)")]
    InvalidBasePath(String),
    #[error("home directory could not be determined")]
    MissingHomeDirectory,
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error("duplicate file name in product catalog: {0}")]
    DuplicateFileName(String),
}

/// Why a single operation handler could not apply an application.
#[derive(Error, Debug)]
pub enum OperationFailure {
    #[error("source file not found: {0}")]
    SourceMissing(PathBuf),
    #[error("configuration file name must be a bare file name: '{0}'")]
    InvalidFileName(String),
    #[error("no apply path given for {0}")]
    MissingApplyPath(String),
    #[error("content of {file} is not valid {language}")]
    InvalidContent { file: String, language: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("invalid configuration type: {0}")]
    UnknownProduct(String),
    #[error("no content validator for language: {0}")]
    UnsupportedLanguage(String),
    #[error("packaging: {0}")]
    Packaging(String),
    #[error("extraction: {0}")]
    Extraction(String),
    #[error("root manifest: {0}")]
    Manifest(String),
    #[error("no application declared for sequence {sequence} of {declared}")]
    SequenceGap { sequence: usize, declared: usize },
    #[error("sequence {sequence}: cannot load metadata '{file}': {reason}")]
    MetadataLoad {
        sequence: usize,
        file: String,
        reason: String,
    },
    #[error("sequence {sequence}: operation '{operation}' failed: {source}")]
    Operation {
        sequence: usize,
        operation: String,
        #[source]
        source: OperationFailure,
    },
    #[error("timed out after {0} seconds")]
    Timeout(u64),
}

impl BundleError {
    /// True for failures caused by the shape of the bundle itself rather than by applying it.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            BundleError::Extraction(_)
                | BundleError::Manifest(_)
                | BundleError::SequenceGap { .. }
                | BundleError::MetadataLoad { .. }
        )
    }

    fn code(&self) -> &'static str {
        match self {
            BundleError::UnknownProduct(_) => "unknown_product",
            BundleError::UnsupportedLanguage(_) => "unsupported_language",
            BundleError::Packaging(_) => "packaging_error",
            BundleError::Extraction(_) => "extraction_error",
            BundleError::Manifest(_) => "manifest_error",
            BundleError::SequenceGap { .. } => "sequence_gap",
            BundleError::MetadataLoad { .. } => "metadata_load_error",
            BundleError::Operation { .. } => "operation_error",
            BundleError::Timeout(_) => "timeout",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Bundle(e) => {
                let status = match e {
                    BundleError::UnknownProduct(_) => StatusCode::BAD_REQUEST,
                    BundleError::Packaging(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    BundleError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, e.code())
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        let details = match &self {
            AppError::Bundle(e) => Some(serde_json::json!({ "structural": e.is_structural() })),
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
