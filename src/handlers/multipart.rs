//! # Multipart Uploads
//!
//! Browser-driven multipart uploads for files too large for a single request:
//!
//! ```text
//! POST /api/upload-start     X-File-Name, X-File-Type  -> uploadId, key
//! POST /api/upload-part      X-Upload-Id, X-Key, X-Part-Number + bytes -> etag
//! POST /api/upload-complete  {uploadId, key, parts}    -> final object
//! POST /api/upload-abort     {uploadId, key}           (see `abort`)
//! ```
//!
//! Parts other than the last must be at least 5 MiB; R2 enforces this at
//! completion.

use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;

use crate::config::Config;
use crate::constants::{
    DEFAULT_CONTENT_TYPE, META_ORIGINAL_NAME, META_UPLOADED_AT, META_UPLOADER_IP, UNKNOWN_UPLOADER,
};
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::middleware::ValidationMiddleware;
use crate::models::{
    CompleteRequest, CompleteResponse, ObjectMetadata, PartRequest, PartResponse, StartRequest,
    StartResponse,
};
use crate::response::ApiResponse;
use crate::store::{MultipartUpload, ObjectStore};
use crate::utils::{generate_upload_key, last_path_segment};

/// Opens a multipart upload under a freshly generated key.
pub async fn start_upload<S: ObjectStore>(
    store: &S,
    request: StartRequest,
    logger: &Logger,
) -> AppResult<ApiResponse> {
    let file_name = ValidationMiddleware::present(request.file_name)
        .ok_or_else(|| AppError::Validation("No file name provided".to_string()))?;
    let file_type = ValidationMiddleware::present(request.file_type)
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let now = Utc::now();
    let key = generate_upload_key(&file_name, now);

    let metadata = ObjectMetadata {
        content_type: Some(file_type),
        custom: HashMap::from([
            (META_ORIGINAL_NAME.to_string(), file_name.clone()),
            (
                META_UPLOADED_AT.to_string(),
                now.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            (
                META_UPLOADER_IP.to_string(),
                request
                    .uploader_address
                    .unwrap_or_else(|| UNKNOWN_UPLOADER.to_string()),
            ),
        ]),
    };

    let upload_id = store.create_multipart_upload(&key, metadata).await?;

    logger.info(
        "Multipart upload started",
        log_data!("uploadId" => &upload_id, "key" => &key),
    );

    ApiResponse::ok(&StartResponse {
        success: true,
        upload_id,
        key,
        file_name,
    })
}

/// Stores one part of an open multipart upload.
pub async fn upload_part<S: ObjectStore>(
    store: &S,
    request: PartRequest,
    logger: &Logger,
) -> AppResult<ApiResponse> {
    let upload_id = ValidationMiddleware::present(request.upload_id);
    let key = ValidationMiddleware::present(request.key);
    let part_number = request
        .part_number
        .as_deref()
        .and_then(ValidationMiddleware::parse_part_number);

    let (Some(upload_id), Some(key), Some(part_number)) = (upload_id, key, part_number) else {
        return Err(AppError::Validation(
            "Missing uploadId, key, or partNumber".to_string(),
        ));
    };

    if request.data.is_empty() {
        return Err(AppError::Validation("Empty part data".to_string()));
    }

    ValidationMiddleware::validate_upload_key(&key)?;

    let size = request.data.len();
    let upload = store.resume_multipart_upload(&key, &upload_id)?;
    let etag = upload.upload_part(part_number, request.data).await?;

    logger.info(
        "Multipart part stored",
        log_data!("uploadId" => upload_id, "partNumber" => part_number, "size" => size),
    );

    ApiResponse::ok(&PartResponse {
        success: true,
        part_number,
        etag,
        size,
    })
}

/// Commits a multipart upload from its parts, sorted by part number.
pub async fn complete_upload<S: ObjectStore>(
    store: &S,
    request: CompleteRequest,
    config: &Config,
    logger: &Logger,
) -> AppResult<ApiResponse> {
    let (Some(upload_id), Some(key), Some(mut parts)) = (
        ValidationMiddleware::present(request.upload_id),
        ValidationMiddleware::present(request.key),
        request.parts,
    ) else {
        return Err(AppError::Validation(
            "Missing uploadId, key, or parts array".to_string(),
        ));
    };

    if parts.is_empty() {
        return Err(AppError::Validation("No parts provided".to_string()));
    }

    ValidationMiddleware::validate_upload_key(&key)?;

    parts.sort_by_key(|part| part.part_number);
    let part_count = parts.len();

    let upload = store.resume_multipart_upload(&key, &upload_id)?;
    let etag = upload.complete(parts).await?;

    logger.info(
        "Multipart upload completed",
        log_data!("uploadId" => upload_id, "key" => &key, "parts" => part_count),
    );

    ApiResponse::ok(&CompleteResponse {
        success: true,
        name: ValidationMiddleware::present(request.file_name)
            .unwrap_or_else(|| last_path_segment(&key).to_string()),
        size: request.file_size.unwrap_or(0),
        content_type: ValidationMiddleware::present(request.file_type)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        url: config.public_url(&key),
        etag,
        key,
    })
}
