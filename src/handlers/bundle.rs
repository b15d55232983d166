//! Bundle handlers: export selected products as a zip download, import an uploaded zip.
//! Pipeline work is blocking file I/O and runs on the blocking pool, optionally under a deadline.

use crate::bundle::importer::{IMPORT_FAILURE, IMPORT_SUCCESS};
use crate::bundle::{BundleImporter, BundlePackager, ImportReport, BUNDLE_FILE_NAME};
use crate::catalog::catalog;
use crate::error::{AppError, BundleError};
use crate::extractors::ProductIds;
use crate::response::success_one_ok;
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use std::io::Cursor;
use std::time::Duration;

/// Multipart field names accepted for the uploaded bundle.
const UPLOAD_FIELDS: &[&str] = &["file", "bundle"];

/// GET /convert-to-bundle?ids=api&ids=tenant: package the products and return `bundle.zip`.
/// The archive is built in memory, so concurrent exports never share a file.
pub async fn export_bundle(
    State(state): State<AppState>,
    ProductIds(ids): ProductIds,
) -> Result<impl IntoResponse, AppError> {
    // Fail fast on unknown ids before touching the filesystem.
    catalog().resolve_all(&ids)?;

    let resources = state.resources.clone();
    let bytes = run_blocking(resources.operation_timeout, move || {
        let packager = BundlePackager::new(catalog(), &resources);
        if let Some(apply_path) = &resources.default_apply_path {
            packager.seed_metadata(&ids, apply_path)?;
        }
        let mut buffer = Cursor::new(Vec::new());
        let entries = packager.package_to_writer(&ids, &mut buffer)?;
        tracing::info!(files = ?entries, "bundle ready for download");
        Ok(buffer.into_inner())
    })
    .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", BUNDLE_FILE_NAME),
            ),
        ],
        bytes,
    ))
}

/// POST /import: multipart upload; replies `Imported successfully` or `Import unsuccessfully` as plain text.
pub async fn import_bundle(State(state): State<AppState>, multipart: Multipart) -> impl IntoResponse {
    let outcome = match read_upload(multipart).await {
        Ok(bytes) => run_import(&state, bytes).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(_) => (StatusCode::OK, IMPORT_SUCCESS),
        Err(e) => {
            tracing::warn!(error = %e, "import failed");
            (StatusCode::BAD_REQUEST, IMPORT_FAILURE)
        }
    }
}

/// POST /import/report: same as /import but replies with the structured report or a typed error.
pub async fn import_bundle_report(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let bytes = read_upload(multipart).await?;
    let report = run_import(&state, bytes).await?;
    Ok(success_one_ok(report))
}

async fn run_import(state: &AppState, bytes: Vec<u8>) -> Result<ImportReport, AppError> {
    // The guard moves into the blocking task: a timed-out import keeps the lock until it really ends.
    let guard = state.import_lock.clone().lock_owned().await;
    let importer = BundleImporter::new(state.resources.work_root.clone())
        .with_operations(state.operations.clone())
        .with_max_extracted_bytes(state.resources.max_extracted_bytes);
    run_blocking(state.resources.operation_timeout, move || {
        let _guard = guard;
        importer.import_bundle(&bytes)
    })
    .await
}

async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if UPLOAD_FIELDS.contains(&name.as_str()) {
            let data = field.bytes().await.map_err(|e| AppError::BadRequest(e.to_string()))?;
            return Ok(data.to_vec());
        }
    }
    Err(AppError::BadRequest("missing 'file' field in multipart body".into()))
}

async fn run_blocking<T, F>(timeout: Option<Duration>, f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, BundleError> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| BundleError::Timeout(limit.as_secs()))?,
        None => task.await,
    };
    let result = joined.map_err(|e| AppError::Internal(format!("pipeline task: {}", e)))?;
    Ok(result?)
}
