use sqlx::SqliteConnection;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Song, SongRow};
use crate::services::FileService;
use crate::storage::Uploads;

const SELECT_SONGS: &str = r#"
    SELECT song.id AS id, file.id AS file_id, file.filename AS filename
    FROM song
    LEFT JOIN file ON file.id = song.song_file_id
"#;

/// Song service
pub struct SongService;

impl SongService {
    /// All songs with their files, in creation order
    pub async fn list_songs(db: &Database) -> Result<Vec<Song>> {
        let rows: Vec<SongRow> = sqlx::query_as(&format!("{} ORDER BY song.id", SELECT_SONGS))
            .fetch_all(db.pool())
            .await?;

        Ok(rows.into_iter().map(Song::from).collect())
    }

    /// Create a song for an existing file
    pub async fn create_song(db: &Database, file_id: i64) -> Result<Song> {
        let mut tx = db.pool().begin().await?;

        let file = FileService::get_file_tx(tx.as_mut(), file_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("A file with id {} does not exist", file_id))
            })?;
        let id = Self::insert_song_tx(tx.as_mut(), Some(file.id)).await?;

        tx.commit().await?;

        tracing::info!("Created song {} for file {}", id, file.id);
        Ok(Song {
            id,
            file: Some(file),
        })
    }

    /// Create a file and a song referencing it in one transaction
    pub async fn create_song_with_upload(
        db: &Database,
        uploads: &Uploads,
        original_name: &str,
        data: &[u8],
    ) -> Result<Song> {
        let filename = FileService::safe_filename(original_name)?;

        let mut tx = db.pool().begin().await?;
        let shared = FileService::filename_in_use_tx(tx.as_mut(), &filename).await?;
        let file = FileService::insert_file_tx(tx.as_mut(), &filename).await?;
        let id = Self::insert_song_tx(tx.as_mut(), Some(file.id)).await?;
        FileService::commit_upload(tx, uploads, &filename, data, shared).await?;

        tracing::info!("Created song {} with uploaded file {}", id, file.filename);
        Ok(Song {
            id,
            file: Some(file),
        })
    }

    /// Delete a song and the file it references.
    ///
    /// The file row stays while another song still references it. The bytes
    /// on disk go once no file row uses the name.
    pub async fn delete_song(db: &Database, uploads: &Uploads, song_id: i64) -> Result<()> {
        let mut tx = db.pool().begin().await?;

        let song = Self::get_song_tx(tx.as_mut(), song_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("A song with id {} does not exist", song_id)))?;

        sqlx::query("DELETE FROM song WHERE id = ?")
            .bind(song.id)
            .execute(tx.as_mut())
            .await?;

        let mut orphaned = None;
        if let Some(file) = song.file {
            if Self::file_referenced_tx(tx.as_mut(), file.id).await? {
                tx.commit().await?;
                tracing::info!("Deleted song {}, file {} still in use", song_id, file.id);
                return Ok(());
            }
            FileService::delete_file_tx(tx.as_mut(), file.id).await?;
            if !FileService::filename_in_use_tx(tx.as_mut(), &file.filename).await? {
                orphaned = Some(file.filename);
            }
        }

        tx.commit().await?;
        tracing::info!("Deleted song {}", song_id);

        if let Some(filename) = orphaned {
            if let Err(e) = uploads.remove(&filename).await {
                tracing::warn!("Failed to remove upload {}: {}", filename, e);
            }
        }

        Ok(())
    }

    async fn get_song_tx(conn: &mut SqliteConnection, song_id: i64) -> Result<Option<Song>> {
        let row: Option<SongRow> = sqlx::query_as(&format!("{} WHERE song.id = ?", SELECT_SONGS))
            .bind(song_id)
            .fetch_optional(conn)
            .await?;
        Ok(row.map(Song::from))
    }

    async fn file_referenced_tx(conn: &mut SqliteConnection, file_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM song WHERE song_file_id = ?")
            .bind(file_id)
            .fetch_one(conn)
            .await?;
        Ok(count > 0)
    }

    async fn insert_song_tx(conn: &mut SqliteConnection, file_id: Option<i64>) -> Result<i64> {
        let id = sqlx::query("INSERT INTO song (song_file_id) VALUES (?)")
            .bind(file_id)
            .execute(conn)
            .await?
            .last_insert_rowid();
        Ok(id)
    }
}
