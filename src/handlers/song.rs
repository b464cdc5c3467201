use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::handlers::file::read_file_field;
use crate::models::{CreateSongRequest, Song, SongResponse};
use crate::schema::{validate, SONG_SCHEMA};
use crate::services::SongService;
use crate::AppState;

/// List songs
/// GET /api/songs
pub async fn list_songs(State(state): State<AppState>) -> Result<Json<Vec<SongResponse>>> {
    let songs = SongService::list_songs(&state.db).await?;
    Ok(Json(songs.iter().map(Song::to_representation).collect()))
}

/// Create a song for a previously uploaded file
/// POST /api/songs {"file": {"id": 1}}
pub async fn create_song(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    let document: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid JSON: {}", e)))?;
    validate(&document, &SONG_SCHEMA)?;

    let req: CreateSongRequest = serde_json::from_value(document)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let song = SongService::create_song(&state.db, req.file.id).await?;
    Ok(created(&song))
}

/// Upload a file and create its song in one go
/// POST /api/songs/upload (multipart, field `file`)
pub async fn upload_song(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (file_name, data) = read_file_field(multipart).await?;

    let song =
        SongService::create_song_with_upload(&state.db, &state.uploads, &file_name, &data).await?;
    Ok(created(&song))
}

/// Delete a song together with its file
/// DELETE /api/files/:id
pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("A song with id {} does not exist", id)))?;

    SongService::delete_song(&state.db, &state.uploads, id).await?;
    Ok(StatusCode::OK)
}

fn created(song: &Song) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/songs?id={}", song.id))],
        Json(song.to_representation()),
    )
}
