use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use verstore::{DeleteReceipt, DirListing, FileRecord, FileService, SaveRequest, UploadReceipt};

use crate::app::AppState;
use crate::error::ApiError;

/// Query flags shared by the `/files` routes.
#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub raw: bool,
}

/// Run a file service call on the blocking pool.
///
/// The task is detached from the request, so a request timeout does not
/// abort a write that has already started.
async fn blocking<T, F>(service: &FileService, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(FileService) -> verstore::Result<T> + Send + 'static,
{
    let service = service.clone();
    Ok(tokio::task::spawn_blocking(move || f(service)).await??)
}

// ============================================================================
// Health
// ============================================================================

pub async fn livez() -> &'static str {
    "ok"
}

// ============================================================================
// /files
// ============================================================================

pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Result<Json<DirListing>, ApiError> {
    let listing = blocking(&state.service, move |s| s.list(query.editable)).await?;
    Ok(Json(listing))
}

pub async fn read_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<FileQuery>,
) -> Result<Response, ApiError> {
    if query.raw {
        let (_, data) =
            blocking(&state.service, move |s| s.read_raw(&path, query.editable)).await?;
        let content_type = if std::str::from_utf8(&data).is_ok() {
            "text/plain; charset=utf-8"
        } else {
            "application/octet-stream"
        };
        return Ok(([(header::CONTENT_TYPE, content_type)], data).into_response());
    }

    let record = blocking(&state.service, move |s| s.read(&path, query.editable)).await?;
    Ok(Json(record).into_response())
}

pub async fn save_file(
    State(state): State<AppState>,
    Path(dir): Path<String>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<FileRecord>, ApiError> {
    save(state, dir, request).await
}

pub async fn save_root_file(
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<FileRecord>, ApiError> {
    save(state, String::new(), request).await
}

async fn save(
    state: AppState,
    dir: String,
    request: SaveRequest,
) -> Result<Json<FileRecord>, ApiError> {
    let record = blocking(&state.service, move |s| s.save(&dir, &request)).await?;
    tracing::info!(name = %record.name, version = ?record.version, "saved");
    Ok(Json(record))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<FileQuery>,
) -> Result<Json<DeleteReceipt>, ApiError> {
    let receipt = blocking(&state.service, move |s| s.delete(&path, query.editable)).await?;
    Ok(Json(receipt))
}

// ============================================================================
// /uploadfiles
// ============================================================================

pub async fn upload_files(
    State(state): State<AppState>,
    Path(dir): Path<String>,
    multipart: Multipart,
) -> Result<Json<UploadReceipt>, ApiError> {
    upload(state, dir, multipart).await
}

pub async fn upload_root_files(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadReceipt>, ApiError> {
    upload(state, String::new(), multipart).await
}

async fn upload(
    state: AppState,
    dir: String,
    mut multipart: Multipart,
) -> Result<Json<UploadReceipt>, ApiError> {
    let mut files: Vec<(String, Bytes)> = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("files") {
            continue;
        }
        let Some(name) = field.file_name().map(str::to_string) else {
            return Err(ApiError::bad_request("Uploaded file has no file name"));
        };
        let data = field.bytes().await?;
        files.push((name, data));
    }
    if files.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }

    let receipt = blocking(&state.service, move |s| {
        s.upload_all(&dir, files.iter().map(|(n, d)| (n.as_str(), &d[..])))
    })
    .await?;
    Ok(Json(receipt))
}

// ============================================================================
// /gitfiles
// ============================================================================

pub async fn list_remote_files(
    State(state): State<AppState>,
) -> Result<Json<DirListing>, ApiError> {
    let listing = blocking(&state.service, |s| s.remote_list()).await?;
    Ok(Json(listing))
}

pub async fn read_remote_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<FileRecord>, ApiError> {
    let record = blocking(&state.service, move |s| s.remote_read(&path)).await?;
    Ok(Json(record))
}
