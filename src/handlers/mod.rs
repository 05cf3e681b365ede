//! # Handlers Module
//!
//! Request handlers for the upload API. Each handler takes the object store
//! by reference and returns an [`ApiResponse`] or an [`AppError`]; the router
//! owns request parsing, CORS and the conversion to a Workers response.
//!
//! [`AppError`]: crate::errors::AppError

use serde_json::json;

use crate::constants::SERVICE_NAME;
use crate::errors::AppResult;
use crate::response::ApiResponse;

pub mod abort;
pub mod delete;
pub mod download;
pub mod list;
pub mod multipart;
pub mod rename;
pub mod upload;

pub use abort::abort_upload;
pub use delete::delete_file;
pub use download::download_file;
pub use list::list_files;
pub use multipart::{complete_upload, start_upload, upload_part};
pub use rename::rename_file;
pub use upload::upload_file;

/// Provides a health check endpoint for monitoring and load balancers.
pub fn health_check() -> AppResult<ApiResponse> {
    ApiResponse::ok(&json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
