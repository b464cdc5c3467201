use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Upload directory on the local file system
pub struct Uploads {
    root: PathBuf,
}

impl Uploads {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Upload root when `filename` is `None`, `root/filename` otherwise.
    ///
    /// The name is joined as-is; run untrusted names through
    /// [`sanitize_filename`] first.
    pub fn resolve(&self, filename: Option<&str>) -> PathBuf {
        match filename {
            Some(name) => self.root.join(name),
            None => self.root.clone(),
        }
    }

    /// Write `data` under `filename`, replacing any previous content.
    ///
    /// Bytes go to a temporary sibling first and are renamed into place.
    pub async fn write(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        let full_path = self.resolve(Some(filename));
        let temp_path = self.resolve(Some(&format!(".upload-{}", Uuid::new_v4())));

        if let Err(e) = write_file(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &full_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!("Saved upload to {:?}", full_path);
        Ok(full_path)
    }

    pub async fn read(&self, filename: &str) -> Result<Bytes> {
        let full_path = self.resolve(Some(filename));
        let not_found = || AppError::NotFound(format!("File {} does not exist", filename));

        match fs::metadata(&full_path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(not_found()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        }

        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                not_found()
            } else {
                AppError::Io(e)
            }
        })?;

        Ok(Bytes::from(data))
    }

    /// Remove the bytes stored under `filename`, if any
    pub async fn remove(&self, filename: &str) -> Result<()> {
        let full_path = self.resolve(Some(filename));

        match fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!("Deleted upload {:?}", full_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Reduce a client supplied file name to a safe single path segment.
///
/// Directory components are dropped, whitespace becomes `_` and anything
/// outside `[A-Za-z0-9._-]` is removed. Returns `None` when nothing usable
/// is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let basename = name
        .rsplit(|ch| ch == '/' || ch == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = basename
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
        .collect();

    let cleaned = cleaned.trim_matches(|ch| ch == '.' || ch == '_');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_joins_root() {
        let uploads = Uploads::new("/srv/uploads");
        assert_eq!(uploads.resolve(None), PathBuf::from("/srv/uploads"));
        assert_eq!(
            uploads.resolve(Some("song.mp3")),
            PathBuf::from("/srv/uploads/song.mp3")
        );
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(
            sanitize_filename("C:\\music\\track 01.mp3").as_deref(),
            Some("track_01.mp3")
        );
    }

    #[test]
    fn sanitize_drops_unsafe_characters() {
        assert_eq!(sanitize_filename("my  song?.ogg").as_deref(), Some("my_song.ogg"));
        assert_eq!(sanitize_filename(".hidden").as_deref(), Some("hidden"));
        assert_eq!(sanitize_filename("test.txt").as_deref(), Some("test.txt"));
    }

    #[test]
    fn sanitize_rejects_empty() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("dir/"), None);
        assert_eq!(sanitize_filename("日本"), None);
    }

    #[tokio::test]
    async fn write_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = Uploads::new(dir.path());

        let path = uploads.write("a.txt", b"File contents").await.unwrap();
        assert_eq!(path, dir.path().join("a.txt"));
        assert_eq!(&uploads.read("a.txt").await.unwrap()[..], b"File contents");

        // No temporary files left behind
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.txt")]);

        uploads.remove("a.txt").await.unwrap();
        assert!(matches!(
            uploads.read("a.txt").await,
            Err(AppError::NotFound(_))
        ));
        uploads.remove("a.txt").await.unwrap();
    }
}
