use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::File;
use crate::storage::{sanitize_filename, Uploads};

/// File service
pub struct FileService;

impl FileService {
    /// Store an uploaded file: insert the `file` row and write its bytes,
    /// committing only once the bytes are on disk.
    pub async fn upload_file(
        db: &Database,
        uploads: &Uploads,
        original_name: &str,
        data: &[u8],
    ) -> Result<File> {
        let filename = Self::safe_filename(original_name)?;

        let mut tx = db.pool().begin().await?;
        let shared = Self::filename_in_use_tx(tx.as_mut(), &filename).await?;
        let file = Self::insert_file_tx(tx.as_mut(), &filename).await?;
        Self::commit_upload(tx, uploads, &filename, data, shared).await?;

        tracing::info!("Stored file {} as {}", file.id, file.filename);
        Ok(file)
    }

    pub(crate) fn safe_filename(original_name: &str) -> Result<String> {
        sanitize_filename(original_name).ok_or_else(|| {
            AppError::Validation(format!("Invalid file name: {:?}", original_name))
        })
    }

    pub(crate) async fn get_file_tx(conn: &mut SqliteConnection, file_id: i64) -> Result<Option<File>> {
        let file = sqlx::query_as("SELECT id, filename FROM file WHERE id = ?")
            .bind(file_id)
            .fetch_optional(conn)
            .await?;
        Ok(file)
    }

    pub(crate) async fn insert_file_tx(conn: &mut SqliteConnection, filename: &str) -> Result<File> {
        let id = sqlx::query("INSERT INTO file (filename) VALUES (?)")
            .bind(filename)
            .execute(conn)
            .await?
            .last_insert_rowid();

        Ok(File {
            id,
            filename: filename.to_string(),
        })
    }

    pub(crate) async fn delete_file_tx(conn: &mut SqliteConnection, file_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM file WHERE id = ?")
            .bind(file_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub(crate) async fn filename_in_use_tx(conn: &mut SqliteConnection, filename: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM file WHERE filename = ?")
            .bind(filename)
            .fetch_one(conn)
            .await?;
        Ok(count > 0)
    }

    /// Write the bytes, then commit. Dropping `tx` on a failed write rolls
    /// the rows back; a failed commit removes bytes no other row points at.
    pub(crate) async fn commit_upload(
        tx: Transaction<'_, Sqlite>,
        uploads: &Uploads,
        filename: &str,
        data: &[u8],
        shared: bool,
    ) -> Result<()> {
        uploads.write(filename, data).await?;

        if let Err(e) = tx.commit().await {
            if !shared {
                if let Err(cleanup) = uploads.remove(filename).await {
                    tracing::error!("Failed to remove orphaned upload {}: {}", filename, cleanup);
                }
            }
            return Err(e.into());
        }

        Ok(())
    }
}
