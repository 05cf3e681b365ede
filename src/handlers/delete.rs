//! # File Deletion
//!
//! Removes one upload. The key must carry the upload prefix; the check runs
//! before the store is contacted. Deleting an absent key succeeds.

use crate::errors::{AppError, AppResult, StoreError};
use crate::log_data;
use crate::logging::Logger;
use crate::middleware::ValidationMiddleware;
use crate::models::{DeleteRequest, DeleteResponse};
use crate::response::ApiResponse;
use crate::store::ObjectStore;

pub async fn delete_file<S: ObjectStore>(
    store: &S,
    request: DeleteRequest,
    logger: &Logger,
) -> AppResult<ApiResponse> {
    let key = ValidationMiddleware::present(request.key)
        .ok_or_else(|| AppError::Validation("No file key provided".to_string()))?;

    ValidationMiddleware::validate_upload_key(&key)?;

    match store.delete(&key).await {
        Ok(()) => logger.info("Deleted upload", log_data!("key" => &key)),
        Err(StoreError::NotFound(message)) => {
            logger.info("Upload already absent", log_data!("key" => &key, "detail" => message))
        }
        Err(error) => return Err(error.into()),
    }

    ApiResponse::ok(&DeleteResponse {
        success: true,
        message: "File deleted successfully".to_string(),
        key,
    })
}
