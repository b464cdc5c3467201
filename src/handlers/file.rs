use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;

use crate::error::{AppError, Result};
use crate::models::FileResponse;
use crate::services::FileService;
use crate::storage::sanitize_filename;
use crate::AppState;

/// Upload a file
/// POST /api/files (multipart, field `file`)
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (file_name, data) = read_file_field(multipart).await?;

    let file = FileService::upload_file(&state.db, &state.uploads, &file_name, &data).await?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(file))))
}

/// Serve uploaded bytes
/// GET /uploads/:filename
pub async fn uploaded_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    // Only names the upload handler could have produced
    if sanitize_filename(&filename).as_deref() != Some(filename.as_str()) {
        return Err(AppError::NotFound(format!("File {} does not exist", filename)));
    }

    let data = state.uploads.read(&filename).await?;
    let content_type = mime_guess::from_path(&filename).first_or_octet_stream();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// Pull the `file` part out of a multipart body as (client file name, bytes).
/// Other fields are skipped.
pub(crate) async fn read_file_field(mut multipart: Multipart) -> Result<(String, Bytes)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::Validation(format!("Failed to process multipart: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        // A `file` part without a file name is a plain form value
        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let data = field.bytes().await.map_err(|e| {
            AppError::Validation(format!("Failed to read file data: {}", e))
        })?;

        return Ok((file_name, data));
    }

    Err(AppError::MissingUpload)
}
