//! # Request Routing and Dispatch
//!
//! Maps `METHOD /path` to a handler, extracts the handler's input from the
//! Workers request, and applies the route's CORS headers to every response,
//! errors and preflights included.
//!
//! ## Supported Routes
//!
//! - `GET  /health`              - Health check endpoint
//! - `GET  /api/list`            - List uploads, newest first
//! - `POST /api/upload`          - Upload a small file in one request
//! - `POST /api/delete`          - Delete an upload
//! - `POST /api/rename`          - Rename an upload
//! - `POST /api/upload-start`    - Open a multipart upload
//! - `POST /api/upload-part`     - Upload one part
//! - `POST /api/upload-complete` - Commit a multipart upload
//! - `POST /api/upload-abort`    - Abort a multipart upload
//! - `GET  /api/download`        - Download an upload as an attachment
//! - `OPTIONS` on any of the above - CORS preflight

use serde::de::DeserializeOwned;
use std::sync::Arc;
use worker::*;

use crate::config::Config;
use crate::constants::{
    HEADER_CONNECTING_IP, HEADER_FILE_NAME, HEADER_FILE_TYPE, HEADER_FORWARDED_FOR, HEADER_KEY,
    HEADER_PART_NUMBER, HEADER_UPLOAD_ID,
};
use crate::errors::{AppError, AppResult};
use crate::handlers::*;
use crate::log_data;
use crate::logging::Logger;
use crate::middleware::{CorsMiddleware, CorsPolicy};
use crate::models::{PartRequest, StartRequest, UploadRequest};
use crate::response::ApiResponse;
use crate::store::r2::R2Store;
use crate::utils::{client_address, decode_header_value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Health,
    List,
    Upload,
    Delete,
    Rename,
    UploadStart,
    UploadPart,
    UploadComplete,
    UploadAbort,
    Download,
}

impl Route {
    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "/health" => Some(Route::Health),
            "/api/list" => Some(Route::List),
            "/api/upload" => Some(Route::Upload),
            "/api/delete" => Some(Route::Delete),
            "/api/rename" => Some(Route::Rename),
            "/api/upload-start" => Some(Route::UploadStart),
            "/api/upload-part" => Some(Route::UploadPart),
            "/api/upload-complete" => Some(Route::UploadComplete),
            "/api/upload-abort" => Some(Route::UploadAbort),
            "/api/download" => Some(Route::Download),
            _ => None,
        }
    }

    /// Like [`Route::from_path`], with unknown paths as a 404 error.
    pub fn resolve(path: &str) -> AppResult<Self> {
        Self::from_path(path).ok_or_else(|| AppError::NotFound("Not found".to_string()))
    }

    /// The single non-preflight method the route answers.
    pub fn method(self) -> Method {
        match self {
            Route::Health | Route::List | Route::Download => Method::Get,
            _ => Method::Post,
        }
    }

    /// Rejects any method other than [`Route::method`] with a 405.
    pub fn allow(self, method: &Method) -> AppResult<()> {
        if *method == self.method() {
            Ok(())
        } else {
            Err(AppError::MethodNotAllowed("Method not allowed".to_string()))
        }
    }

    pub fn cors_policy(self) -> CorsPolicy {
        match self {
            Route::Health | Route::List | Route::Download => CorsPolicy::READ,
            Route::Upload => CorsPolicy::UPLOAD,
            Route::UploadStart => CorsPolicy::UPLOAD_START,
            Route::UploadPart => CorsPolicy::UPLOAD_PART,
            Route::Delete | Route::Rename | Route::UploadComplete | Route::UploadAbort => {
                CorsPolicy::WRITE
            }
        }
    }
}

/// Handles incoming HTTP requests and routes them to appropriate handlers.
pub async fn handle_request(req: Request, env: Env, config: Arc<Config>) -> Result<Response> {
    let logger = Logger::for_request();
    let method = req.method();
    let path = req.url()?.path().to_string();

    logger.info(
        "Routing request",
        log_data!("method" => method.to_string(), "path" => path.as_str()),
    );

    let route = match Route::resolve(&path) {
        Ok(route) => route,
        Err(error) => {
            log_failure(&logger, &path, &error);
            return finalize(Err(error), CorsPolicy::READ, logger.request_id()).into_worker();
        }
    };
    let policy = route.cors_policy();

    // Handle CORS preflight requests early to avoid unnecessary processing
    if method == Method::Options {
        return CorsMiddleware::handle_preflight(policy).into_worker();
    }

    let result = dispatch(route, method, req, &env, &config, &logger).await;
    if let Err(error) = &result {
        log_failure(&logger, &path, error);
    }

    finalize(result, policy, logger.request_id()).into_worker()
}

/// Turns a handler outcome into the final response: errors become the JSON
/// envelope, and every response carries the route's CORS headers and the
/// request id.
pub fn finalize(result: AppResult<ApiResponse>, policy: CorsPolicy, request_id: &str) -> ApiResponse {
    let response = result.unwrap_or_else(|error| error.to_response());
    CorsMiddleware::apply_headers(response, policy).with_header("X-Request-Id", request_id)
}

fn log_failure(logger: &Logger, path: &str, error: &AppError) {
    let data = log_data!("path" => path, "status" => error.status().as_u16(), "error" => error.to_string());
    if error.status().is_server_error() {
        logger.error("Request failed", data);
    } else {
        logger.warn("Request rejected", data);
    }
}

async fn dispatch(
    route: Route,
    method: Method,
    mut req: Request,
    env: &Env,
    config: &Config,
    logger: &Logger,
) -> AppResult<ApiResponse> {
    route.allow(&method)?;

    let bucket = || R2Store::from_env(env, &config.bucket_name);

    match route {
        Route::Health => health_check(),
        Route::List => list_files(&bucket()?, config, logger).await,
        Route::Upload => {
            let request = UploadRequest {
                file_name: header(&req, HEADER_FILE_NAME)?.map(|raw| decode_header_value(&raw)),
                file_type: header(&req, HEADER_FILE_TYPE)?,
                uploader_address: Some(client_address(
                    header(&req, HEADER_CONNECTING_IP)?,
                    header(&req, HEADER_FORWARDED_FOR)?,
                )),
                data: req.bytes().await?,
            };
            upload_file(&bucket()?, request, config, logger).await
        }
        Route::Delete => {
            let request = read_json(&mut req).await?;
            delete_file(&bucket()?, request, logger).await
        }
        Route::Rename => {
            let request = read_json(&mut req).await?;
            rename_file(&bucket()?, request, config, logger).await
        }
        Route::UploadStart => {
            let request = StartRequest {
                file_name: header(&req, HEADER_FILE_NAME)?.map(|raw| decode_header_value(&raw)),
                file_type: header(&req, HEADER_FILE_TYPE)?,
                uploader_address: Some(client_address(
                    header(&req, HEADER_CONNECTING_IP)?,
                    header(&req, HEADER_FORWARDED_FOR)?,
                )),
            };
            start_upload(&bucket()?, request, logger).await
        }
        Route::UploadPart => {
            let request = PartRequest {
                upload_id: header(&req, HEADER_UPLOAD_ID)?,
                key: header(&req, HEADER_KEY)?,
                part_number: header(&req, HEADER_PART_NUMBER)?,
                data: req.bytes().await?,
            };
            upload_part(&bucket()?, request, logger).await
        }
        Route::UploadComplete => {
            let request = read_json(&mut req).await?;
            complete_upload(&bucket()?, request, config, logger).await
        }
        Route::UploadAbort => {
            let request = read_json(&mut req).await?;
            abort_upload(&bucket()?, request, config, logger).await
        }
        Route::Download => {
            let key = req
                .url()?
                .query_pairs()
                .find(|(name, _)| name == "key")
                .map(|(_, value)| value.into_owned());
            download_file(&bucket()?, key).await
        }
    }
}

async fn read_json<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    req.json::<T>()
        .await
        .map_err(|_| AppError::Validation("Invalid JSON in request body".to_string()))
}

fn header(req: &Request, name: &str) -> AppResult<Option<String>> {
    Ok(req.headers().get(name)?)
}
