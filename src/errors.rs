use http::StatusCode;
use serde_json::json;
use thiserror::Error;
use worker::Error as WorkerError;

use crate::response::ApiResponse;

/// Failures reported by the object store, split by whether the target exists.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// R2 codes for a missing multipart session (`10024`, NoSuchUpload) and a
/// missing object (`10007`, NoSuchKey). Free-text phrases such as
/// "does not exist" also appear in bucket and binding failures, so only these
/// codes count.
const NOT_FOUND_MARKERS: &[&str] = &["(10024)", "nosuchupload", "(10007)", "nosuchkey"];

impl StoreError {
    /// Sorts a raw store message into `NotFound` or `Backend`.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if NOT_FOUND_MARKERS.iter().any(|marker| lowered.contains(marker)) {
            StoreError::NotFound(message)
        } else {
            StoreError::Backend(message)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<WorkerError> for StoreError {
    fn from(error: WorkerError) -> Self {
        StoreError::classify(error.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    MethodNotAllowed(String),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Store(_) | AppError::Internal(_) | AppError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Renders the error as the `{success:false, error}` envelope.
    pub fn to_response(&self) -> ApiResponse {
        ApiResponse::json(
            self.status(),
            json!({
                "success": false,
                "error": self.to_string(),
            }),
        )
    }
}

impl From<StoreError> for WorkerError {
    fn from(error: StoreError) -> Self {
        WorkerError::RustError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognises_missing_multipart_upload() {
        let err = StoreError::classify(
            "abort: The specified multipart upload does not exist. (10024)",
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn classify_recognises_missing_object() {
        assert!(StoreError::classify("get: The specified key does not exist. (10007)").is_not_found());
        assert!(StoreError::classify("NoSuchKey").is_not_found());
    }

    #[test]
    fn classify_treats_other_failures_as_backend() {
        let err = StoreError::classify("internal error (10001)");
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn missing_bucket_is_a_backend_failure() {
        for message in [
            "delete: The specified bucket does not exist. (10006)",
            "Binding UPLOADS not found",
            "abort: bucket does not exist (10006)",
        ] {
            assert!(
                matches!(StoreError::classify(message), StoreError::Backend(_)),
                "{message}"
            );
        }
    }

    #[test]
    fn status_codes_follow_error_class() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Store(StoreError::Backend("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_envelope_exposes_message() {
        let response = AppError::Forbidden("Invalid file key".into()).to_response();
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(
            response.json_body(),
            Some(&json!({ "success": false, "error": "Invalid file key" }))
        );
    }
}
