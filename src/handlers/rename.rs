//! # File Rename
//!
//! Gives an upload a new display name. R2 has no rename, so the object is
//! copied to a key derived from the new name and the old key is deleted. The
//! copy streams the body; it is not buffered.
//!
//! The two steps are not atomic: if the delete fails the object exists under
//! both keys and the request reports the failure.

use chrono::{SecondsFormat, Utc};

use crate::config::Config;
use crate::constants::{META_ORIGINAL_NAME, META_PREVIOUS_NAME, META_RENAMED_AT};
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::middleware::ValidationMiddleware;
use crate::models::{RenameRequest, RenameResponse};
use crate::response::ApiResponse;
use crate::store::ObjectStore;
use crate::utils::{last_path_segment, renamed_key, sanitize_display_name};

pub async fn rename_file<S: ObjectStore>(
    store: &S,
    request: RenameRequest,
    config: &Config,
    logger: &Logger,
) -> AppResult<ApiResponse> {
    let (Some(key), Some(new_name)) = (
        ValidationMiddleware::present(request.key),
        ValidationMiddleware::present(request.new_name),
    ) else {
        return Err(AppError::Validation(
            "Missing required fields: key and newName".to_string(),
        ));
    };

    ValidationMiddleware::validate_upload_key(&key)?;

    let name = sanitize_display_name(&new_name);
    if name.is_empty() {
        return Err(AppError::Validation("Invalid filename".to_string()));
    }

    let object = store
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let now = Utc::now();
    let new_key = renamed_key(&key, &name, now);
    if new_key == key {
        return ApiResponse::ok(&RenameResponse {
            success: true,
            message: "File name unchanged".to_string(),
            key: Some(key.clone()),
            old_key: None,
            new_key: key,
            name,
            url: None,
        });
    }

    let previous_name = object
        .metadata
        .original_name()
        .unwrap_or_else(|| last_path_segment(&key))
        .to_string();
    let mut metadata = object.metadata;
    metadata
        .custom
        .insert(META_ORIGINAL_NAME.to_string(), name.clone());
    metadata.custom.insert(
        META_RENAMED_AT.to_string(),
        now.to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    metadata
        .custom
        .insert(META_PREVIOUS_NAME.to_string(), previous_name);

    store.put(&new_key, object.body, object.size, metadata).await?;

    if let Err(error) = store.delete(&key).await {
        logger.error(
            "Renamed copy written but old key not removed",
            log_data!("key" => &key, "newKey" => &new_key, "error" => error.to_string()),
        );
        return Err(error.into());
    }

    logger.info(
        "Renamed upload",
        log_data!("key" => &key, "newKey" => &new_key),
    );

    ApiResponse::ok(&RenameResponse {
        success: true,
        message: "File renamed successfully".to_string(),
        key: None,
        old_key: Some(key),
        url: Some(config.public_url(&new_key)),
        new_key,
        name,
    })
}
