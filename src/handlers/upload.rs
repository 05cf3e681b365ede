//! # Single-Shot Upload
//!
//! Stores a small file sent as the raw request body. The file name and type
//! travel in `X-File-Name` and `X-File-Type` headers; the name may be
//! percent-encoded. Large files go through the multipart endpoints instead.

use chrono::{SecondsFormat, Utc};
use futures::{future, stream, StreamExt};
use std::collections::HashMap;

use crate::config::Config;
use crate::constants::{
    DEFAULT_CONTENT_TYPE, META_ORIGINAL_NAME, META_SIZE, META_UPLOADED_AT, META_UPLOADER_IP,
    UNKNOWN_UPLOADER,
};
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::middleware::ValidationMiddleware;
use crate::models::{ObjectMetadata, ObjectStream, UploadRequest, UploadResponse};
use crate::response::ApiResponse;
use crate::store::ObjectStore;
use crate::utils::generate_upload_key;

pub async fn upload_file<S: ObjectStore>(
    store: &S,
    request: UploadRequest,
    config: &Config,
    logger: &Logger,
) -> AppResult<ApiResponse> {
    let file_name = ValidationMiddleware::present(request.file_name).ok_or_else(|| {
        AppError::Validation("No file name provided in X-File-Name header".to_string())
    })?;
    let file_type = ValidationMiddleware::present(request.file_type)
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    if request.data.is_empty() {
        return Err(AppError::Validation("Empty file received".to_string()));
    }

    let now = Utc::now();
    let key = generate_upload_key(&file_name, now);
    let size = request.data.len() as u64;

    let metadata = ObjectMetadata {
        content_type: Some(file_type.clone()),
        custom: HashMap::from([
            (META_ORIGINAL_NAME.to_string(), file_name.clone()),
            (
                META_UPLOADED_AT.to_string(),
                now.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            (META_SIZE.to_string(), size.to_string()),
            (
                META_UPLOADER_IP.to_string(),
                request
                    .uploader_address
                    .unwrap_or_else(|| UNKNOWN_UPLOADER.to_string()),
            ),
        ]),
    };

    let body: ObjectStream = stream::once(future::ready(Ok(request.data))).boxed_local();
    store.put(&key, body, size, metadata).await?;

    logger.info("Stored upload", log_data!("key" => &key, "size" => size));

    ApiResponse::ok(&UploadResponse {
        success: true,
        url: config.public_url(&key),
        key,
        name: file_name,
        size,
        content_type: file_type,
    })
}
