//! # Multipart Abort
//!
//! Cancels an in-progress multipart upload and releases its parts.
//!
//! ## Session States
//!
//! ```text
//! Initiated --complete--> Committed
//! Initiated --abort-----> Aborted
//! Initiated --expiry----> Gone
//! ```
//!
//! Aborting a committed, aborted or expired session fails in the store with a
//! not-found error; that outcome is reported as success. Other abort failures
//! are logged and, unless `Config::strict_abort` is set, also reported as
//! success.

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::middleware::ValidationMiddleware;
use crate::models::{AbortRequest, MessageResponse};
use crate::response::ApiResponse;
use crate::store::{MultipartUpload, ObjectStore};

pub async fn abort_upload<S: ObjectStore>(
    store: &S,
    request: AbortRequest,
    config: &Config,
    logger: &Logger,
) -> AppResult<ApiResponse> {
    let (Some(upload_id), Some(key)) = (
        ValidationMiddleware::present(request.upload_id),
        ValidationMiddleware::present(request.key),
    ) else {
        return Err(AppError::Validation("Missing uploadId or key".to_string()));
    };

    ValidationMiddleware::validate_upload_key(&key)?;

    let upload = store.resume_multipart_upload(&key, &upload_id)?;

    match upload.abort().await {
        Ok(()) => logger.info(
            "Multipart upload aborted",
            log_data!("uploadId" => upload_id, "key" => key),
        ),
        Err(error) if error.is_not_found() => logger.info(
            "Multipart upload already gone",
            log_data!("uploadId" => upload_id, "key" => key, "detail" => error.to_string()),
        ),
        Err(error) => {
            logger.warn(
                "Multipart abort failed",
                log_data!(
                    "uploadId" => upload_id,
                    "key" => key,
                    "error" => error.to_string(),
                    "strict" => config.strict_abort
                ),
            );
            if config.strict_abort {
                return Err(error.into());
            }
        }
    }

    ApiResponse::ok(&MessageResponse {
        success: true,
        message: "Upload aborted successfully".to_string(),
    })
}
