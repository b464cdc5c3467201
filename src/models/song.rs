use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{File, FileResponse};

/// Song row joined with its file. `file_id` and `filename` are NULL when
/// the song has no file.
#[derive(Debug, Clone, FromRow)]
pub struct SongRow {
    pub id: i64,
    pub file_id: Option<i64>,
    pub filename: Option<String>,
}

/// Song model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub id: i64,
    pub file: Option<File>,
}

impl From<SongRow> for Song {
    fn from(row: SongRow) -> Self {
        let file = match (row.file_id, row.filename) {
            (Some(id), Some(filename)) => Some(File { id, filename }),
            _ => None,
        };
        Self { id: row.id, file }
    }
}

/// JSON shape of a song. `file` is omitted for a song without a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongResponse {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileResponse>,
}

impl Song {
    pub fn to_representation(&self) -> SongResponse {
        SongResponse {
            id: self.id,
            file: self.file.as_ref().map(File::to_representation),
        }
    }
}

/// Body of `POST /api/songs`, read after schema validation
#[derive(Debug, Deserialize)]
pub struct CreateSongRequest {
    pub file: FileReference,
}

#[derive(Debug, Deserialize)]
pub struct FileReference {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn song_with_file() {
        let song = Song::from(SongRow {
            id: 1,
            file_id: Some(4),
            filename: Some("a.ogg".to_string()),
        });
        assert_eq!(
            serde_json::to_value(song.to_representation()).unwrap(),
            json!({"id": 1, "file": {"id": 4, "name": "a.ogg", "path": "/uploads/a.ogg"}})
        );
    }

    #[test]
    fn song_without_file_omits_key() {
        let song = Song::from(SongRow {
            id: 2,
            file_id: None,
            filename: None,
        });
        assert_eq!(song.file, None);
        assert_eq!(
            serde_json::to_value(song.to_representation()).unwrap(),
            json!({"id": 2})
        );
    }
}
