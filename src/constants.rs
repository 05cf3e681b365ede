//! # Application Constants
//!
//! Binding names, key layout, limits and header names shared across the
//! upload API. Binding names must match the `wrangler.toml` configuration.

/// KV binding holding the optional JSON configuration document
pub const STORAGE_CONFIG_KV_NAME: &str = "STORAGE_CONFIG";

/// Key of the configuration document inside the KV namespace
pub const STORAGE_CONFIG_KEY: &str = "config";

/// Default R2 bucket binding name
pub const DEFAULT_BUCKET_NAME: &str = "UPLOADS";

/// Literal key prefix confining every object this service touches
pub const UPLOAD_PREFIX: &str = "uploads/";

/// Default public base URL; object URLs are `base + key`
pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://pub-dfd62da8016b4d75ba2c3f02a875656f.r2.dev/";

/// Hard ceiling on objects returned by a single listing
pub const MAX_LIST_LIMIT: u32 = 1000;

/// Default number of concurrent metadata lookups while listing
pub const DEFAULT_METADATA_CONCURRENCY: usize = 32;

/// Highest part number R2 accepts for a multipart upload
pub const MAX_PART_NUMBER: u16 = 10_000;

/// Content type used when neither the client nor the store supplies one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Placeholder for an unrecorded uploader address
pub const UNKNOWN_UPLOADER: &str = "unknown";

/// Custom metadata keys written alongside uploaded objects
pub const META_ORIGINAL_NAME: &str = "originalName";
pub const META_SIZE: &str = "size";
pub const META_UPLOADED_AT: &str = "uploadedAt";
pub const META_UPLOADER_IP: &str = "uploaderIP";
pub const META_UPLOADER_ADDRESS: &str = "uploaderAddress";
pub const META_RENAMED_AT: &str = "renamedAt";
pub const META_PREVIOUS_NAME: &str = "previousName";

/// Request headers used by the upload endpoints
pub const HEADER_FILE_NAME: &str = "X-File-Name";
pub const HEADER_FILE_TYPE: &str = "X-File-Type";
pub const HEADER_UPLOAD_ID: &str = "X-Upload-Id";
pub const HEADER_KEY: &str = "X-Key";
pub const HEADER_PART_NUMBER: &str = "X-Part-Number";
pub const HEADER_CONNECTING_IP: &str = "CF-Connecting-IP";
pub const HEADER_FORWARDED_FOR: &str = "X-Forwarded-For";

/// CORS header for allowed origins
pub const CORS_ALLOW_ORIGIN: &str = "*";

/// CORS method sets, one per route family
pub const CORS_METHODS_READ: &str = "GET, OPTIONS";
pub const CORS_METHODS_WRITE: &str = "POST, OPTIONS";

/// CORS allowed request headers
pub const CORS_HEADERS_DEFAULT: &str = "Content-Type";
pub const CORS_HEADERS_UPLOAD: &str = "Content-Type, X-File-Name, X-File-Type, X-File-Size";
pub const CORS_HEADERS_UPLOAD_START: &str = "Content-Type, X-File-Name, X-File-Type";
pub const CORS_HEADERS_UPLOAD_PART: &str = "Content-Type, X-Upload-Id, X-Key, X-Part-Number";

/// Service name reported by the health check
pub const SERVICE_NAME: &str = "uploads-worker";
