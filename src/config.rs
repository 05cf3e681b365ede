//! # Configuration Management
//!
//! Configuration lives in Cloudflare KV under the `config` key of the
//! `STORAGE_CONFIG` namespace. Every field is optional; anything missing falls
//! back to the defaults below, and a deployment without the KV binding runs on
//! defaults entirely.
//!
//! ## Configuration Format
//!
//! ```json
//! {
//!   "bucket_name": "UPLOADS",
//!   "public_base_url": "https://files.example.com/",
//!   "list_limit": 1000,
//!   "metadata_concurrency": 32,
//!   "strict_abort": false
//! }
//! ```

use crate::constants::{
    DEFAULT_BUCKET_NAME, DEFAULT_METADATA_CONCURRENCY, DEFAULT_PUBLIC_BASE_URL, MAX_LIST_LIMIT,
    STORAGE_CONFIG_KEY,
};
use crate::log_data;
use crate::logging::Logger;
use serde::{Deserialize, Serialize};
use worker::kv::KvStore;

/// Runtime settings for the upload API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the R2 bucket binding. Must match wrangler.toml.
    pub bucket_name: String,

    /// Base prepended to object keys to form public URLs.
    pub public_base_url: String,

    /// Maximum objects per listing; values above 1000 are clamped.
    pub list_limit: u32,

    /// Upper bound on concurrent metadata lookups while listing.
    pub metadata_concurrency: usize,

    /// When set, abort failures other than "upload not found" surface as 500
    /// instead of being reported as success.
    pub strict_abort: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket_name: DEFAULT_BUCKET_NAME.to_string(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            list_limit: MAX_LIST_LIMIT,
            metadata_concurrency: DEFAULT_METADATA_CONCURRENCY,
            strict_abort: false,
        }
    }
}

impl Config {
    /// Loads configuration from KV storage with fallback to defaults.
    ///
    /// A missing key, a failed KV read and a malformed document all yield the
    /// defaults; the latter two are logged as warnings.
    pub async fn load(kv: &KvStore, logger: &Logger) -> Self {
        match kv.get(STORAGE_CONFIG_KEY).text().await {
            Ok(document) => Self::from_document(document.as_deref(), logger),
            Err(error) => {
                logger.warn(
                    "Failed to read configuration, using defaults",
                    log_data!("error" => format!("{error:?}")),
                );
                Self::default()
            }
        }
    }

    /// Parses a stored configuration document.
    pub fn from_document(document: Option<&str>, logger: &Logger) -> Self {
        let Some(document) = document else {
            return Self::default();
        };
        match serde_json::from_str::<Config>(document) {
            Ok(config) => config.normalized(),
            Err(error) => {
                logger.warn(
                    "Malformed configuration document, using defaults",
                    log_data!("error" => error.to_string()),
                );
                Self::default()
            }
        }
    }

    /// Clamps values the service cannot honour.
    pub fn normalized(mut self) -> Self {
        self.list_limit = self.list_limit.clamp(1, MAX_LIST_LIMIT);
        self.metadata_concurrency = self.metadata_concurrency.max(1);
        self
    }

    /// Public URL for an object key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}{}", self.public_base_url, key)
    }
}
