//! # File Listing
//!
//! Lists uploads under the upload prefix, enriches each entry with its stored
//! metadata and returns them newest first.
//!
//! One `head` lookup is issued per listed object. Lookups run concurrently,
//! capped at `Config::metadata_concurrency`, and the response waits for all
//! of them; a single failure fails the whole listing.

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::config::Config;
use crate::constants::{MAX_LIST_LIMIT, UPLOAD_PREFIX};
use crate::errors::{AppResult, StoreError};
use crate::log_data;
use crate::logging::Logger;
use crate::models::{FileRecord, ListResponse};
use crate::response::ApiResponse;
use crate::store::ObjectStore;

pub async fn list_files<S: ObjectStore>(
    store: &S,
    config: &Config,
    logger: &Logger,
) -> AppResult<ApiResponse> {
    let limit = config.list_limit.min(MAX_LIST_LIMIT);
    let listed = store.list(UPLOAD_PREFIX, limit).await?;

    let mut files: Vec<FileRecord> = stream::iter(listed)
        .map(|object| async move {
            let metadata = store.head(&object.key).await?;
            let url = config.public_url(&object.key);
            Ok::<_, StoreError>(FileRecord::from_listing(object, metadata, url))
        })
        .buffer_unordered(config.metadata_concurrency.max(1))
        .try_collect()
        .await?;

    files.sort_by(|a, b| b.uploaded_instant.cmp(&a.uploaded_instant));

    logger.info("Listed uploads", log_data!("count" => files.len()));

    ApiResponse::ok(&ListResponse {
        success: true,
        count: files.len(),
        files,
    })
}
