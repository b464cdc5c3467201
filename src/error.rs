use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mime_guess::mime::Mime;
use serde::Serialize;

use crate::schema::ValidationError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Could not find file data")]
    MissingUpload,

    #[error("Request must accept {0} data")]
    NotAcceptable(Mime),

    #[error("Request must contain {0} data")]
    UnsupportedMediaType(Mime),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Error body. Lookups by id answer with an `Error` key, everything else with `message`.
#[derive(Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Message { message: String },
    Error {
        #[serde(rename = "Error")]
        error: String,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, message("Database error"))
            }
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, message(msg)),
            AppError::MissingUpload => (StatusCode::UNPROCESSABLE_ENTITY, message(&self.to_string())),
            AppError::NotAcceptable(_) => (StatusCode::NOT_ACCEPTABLE, message(&self.to_string())),
            AppError::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, message(&self.to_string()))
            }
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody::Error { error: msg.clone() },
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, message(msg))
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, message("IO error"))
            }
        };

        (status, Json(body)).into_response()
    }
}

fn message(msg: &str) -> ErrorBody {
    ErrorBody::Message {
        message: msg.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_uses_error_key() {
        let body = ErrorBody::Error {
            error: "gone".to_string(),
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"Error":"gone"}"#);
    }

    #[test]
    fn guard_errors_name_the_media_type() {
        let err = AppError::NotAcceptable(mime_guess::mime::APPLICATION_JSON);
        assert_eq!(err.to_string(), "Request must accept application/json data");

        let err = AppError::UnsupportedMediaType(mime_guess::mime::MULTIPART_FORM_DATA);
        assert_eq!(err.to_string(), "Request must contain multipart/form-data data");
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::MissingUpload.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::UnsupportedMediaType(mime_guess::mime::APPLICATION_JSON)
                .into_response()
                .status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }
}
