//! # Uploads Worker
//!
//! Upload lifecycle API for files kept in a Cloudflare R2 bucket under the
//! `uploads/` prefix: listing, deletion, multipart upload management and
//! attachment downloads.
//!
//! ## Architecture
//!
//! - **Router**: Maps requests to handlers and applies per-route CORS headers
//! - **Handlers**: Stateless operations over an injected [`store::ObjectStore`]
//! - **Store**: The object-store capability and its R2 implementation
//! - **Middleware**: CORS and the key-prefix confinement check
//! - **Config**: Optional KV-backed settings with defaults
//!
//! ## API
//!
//! ```text
//! GET  /api/list             - List uploads, newest first
//! POST /api/delete           - Delete an upload
//! POST /api/upload-start     - Open a multipart upload
//! POST /api/upload-part      - Upload one part
//! POST /api/upload-complete  - Commit a multipart upload
//! POST /api/upload-abort     - Abort a multipart upload
//! GET  /api/download?key=    - Download an upload
//! GET  /health               - Health check
//! ```

use std::sync::{Arc, OnceLock};
use worker::*;

mod config;
mod constants;
mod errors;
mod handlers;
mod logging;
mod middleware;
mod models;
mod response;
mod router;
mod store;
mod utils;

use config::Config;
use constants::STORAGE_CONFIG_KV_NAME;
use logging::Logger;

static CONFIG_CACHE: OnceLock<Arc<Config>> = OnceLock::new();

/// Main entry point for the Cloudflare Worker.
#[event(fetch)]
pub async fn main(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();

    let config = load_config(&env).await;

    router::handle_request(req, env, config).await
}

/// Loads configuration once per isolate. A deployment without the KV binding,
/// or with an unreadable document, runs on defaults.
async fn load_config(env: &Env) -> Arc<Config> {
    if let Some(config) = CONFIG_CACHE.get() {
        return config.clone();
    }

    let config = match env.kv(STORAGE_CONFIG_KV_NAME) {
        Ok(kv) => Config::load(&kv, &Logger::new("config".to_string())).await,
        Err(_) => Config::default(),
    };
    let config = Arc::new(config);
    let _ = CONFIG_CACHE.set(config.clone());
    config
}
