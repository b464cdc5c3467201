use serde::Serialize;
use sqlx::FromRow;

/// Public URL prefix under which uploaded bytes are served
pub const UPLOADS_PREFIX: &str = "/uploads";

/// File model - one uploaded asset
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct File {
    pub id: i64,
    pub filename: String,
}

/// JSON shape of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResponse {
    pub id: i64,
    pub name: String,
    pub path: String,
}

impl File {
    pub fn to_representation(&self) -> FileResponse {
        FileResponse {
            id: self.id,
            name: self.filename.clone(),
            path: format!("{}/{}", UPLOADS_PREFIX, self.filename),
        }
    }
}

impl From<File> for FileResponse {
    fn from(file: File) -> Self {
        file.to_representation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn representation() {
        let file = File {
            id: 3,
            filename: "intro.mp3".to_string(),
        };
        assert_eq!(
            serde_json::to_value(file.to_representation()).unwrap(),
            json!({"id": 3, "name": "intro.mp3", "path": "/uploads/intro.mp3"})
        );
    }
}
