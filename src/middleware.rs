//! # Middleware Components
//!
//! Cross-cutting request and response processing: per-route CORS headers and
//! the validation checks every handler runs before touching the store.
//!
//! ## Usage Examples
//!
//! ```rust,ignore
//! // Answer a preflight for the delete route
//! let response = CorsMiddleware::handle_preflight(CorsPolicy::WRITE);
//!
//! // Refuse keys outside the upload prefix
//! ValidationMiddleware::validate_upload_key(&key)?;
//! ```

use crate::constants::{
    CORS_ALLOW_ORIGIN, CORS_HEADERS_DEFAULT, CORS_HEADERS_UPLOAD, CORS_HEADERS_UPLOAD_PART,
    CORS_HEADERS_UPLOAD_START,
    CORS_METHODS_READ, CORS_METHODS_WRITE, MAX_PART_NUMBER, UPLOAD_PREFIX,
};
use crate::errors::{AppError, AppResult};
use crate::response::ApiResponse;

/// The CORS method and header sets advertised by one route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CorsPolicy {
    pub methods: &'static str,
    pub headers: &'static str,
}

impl CorsPolicy {
    pub const READ: CorsPolicy = CorsPolicy {
        methods: CORS_METHODS_READ,
        headers: CORS_HEADERS_DEFAULT,
    };
    pub const WRITE: CorsPolicy = CorsPolicy {
        methods: CORS_METHODS_WRITE,
        headers: CORS_HEADERS_DEFAULT,
    };
    pub const UPLOAD: CorsPolicy = CorsPolicy {
        methods: CORS_METHODS_WRITE,
        headers: CORS_HEADERS_UPLOAD,
    };
    pub const UPLOAD_START: CorsPolicy = CorsPolicy {
        methods: CORS_METHODS_WRITE,
        headers: CORS_HEADERS_UPLOAD_START,
    };
    pub const UPLOAD_PART: CorsPolicy = CorsPolicy {
        methods: CORS_METHODS_WRITE,
        headers: CORS_HEADERS_UPLOAD_PART,
    };
}

/// Middleware for handling Cross-Origin Resource Sharing (CORS) requests.
///
/// Every response, including errors and preflights, goes through
/// [`CorsMiddleware::apply_headers`]. All origins are allowed.
pub struct CorsMiddleware;

impl CorsMiddleware {
    pub fn apply_headers(response: ApiResponse, policy: CorsPolicy) -> ApiResponse {
        response
            .with_header("Access-Control-Allow-Origin", CORS_ALLOW_ORIGIN)
            .with_header("Access-Control-Allow-Methods", policy.methods)
            .with_header("Access-Control-Allow-Headers", policy.headers)
    }

    /// Empty-bodied answer to an OPTIONS request.
    pub fn handle_preflight(policy: CorsPolicy) -> ApiResponse {
        Self::apply_headers(ApiResponse::empty(), policy)
    }
}

/// Middleware for validating request parameters.
///
/// Checks here never call the store; handlers run them first so that invalid
/// requests short-circuit before any side effect.
pub struct ValidationMiddleware;

impl ValidationMiddleware {
    /// Treats absent and empty values alike.
    pub fn present(value: Option<String>) -> Option<String> {
        value.filter(|value| !value.is_empty())
    }

    /// Confines a key to the upload prefix.
    ///
    /// The comparison is on the literal key as received: no decoding, no path
    /// normalization. `uploads/../secret` passes and reaches the store
    /// verbatim, where R2 treats it as an opaque key.
    pub fn validate_upload_key(key: &str) -> AppResult<()> {
        if key.starts_with(UPLOAD_PREFIX) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Invalid file key".to_string()))
        }
    }

    /// Parses a part number header; R2 accepts 1 through 10000.
    pub fn parse_part_number(raw: &str) -> Option<u16> {
        raw.trim()
            .parse::<u16>()
            .ok()
            .filter(|number| (1..=MAX_PART_NUMBER).contains(number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_is_empty_with_route_headers() {
        let response = CorsMiddleware::handle_preflight(CorsPolicy::UPLOAD_PART);
        assert_eq!(response.json_body(), None);
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(response.header("Access-Control-Allow-Methods"), Some("POST, OPTIONS"));
        assert_eq!(
            response.header("Access-Control-Allow-Headers"),
            Some("Content-Type, X-Upload-Id, X-Key, X-Part-Number")
        );
    }

    #[test]
    fn validate_upload_key_accepts_prefixed_keys() {
        assert!(ValidationMiddleware::validate_upload_key("uploads/a.png").is_ok());
    }

    #[test]
    fn validate_upload_key_rejects_everything_else() {
        for key in [
            "secrets/config.json",
            "Uploads/a.png",
            "/uploads/a.png",
            "uploads",
            "%75ploads/a.png",
            "",
        ] {
            let err = ValidationMiddleware::validate_upload_key(key).unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)), "{key}");
        }
    }

    #[test]
    fn present_filters_empty_strings() {
        assert_eq!(ValidationMiddleware::present(Some(String::new())), None);
        assert_eq!(
            ValidationMiddleware::present(Some("k".into())),
            Some("k".to_string())
        );
    }

    #[test]
    fn part_numbers_must_be_in_range() {
        assert_eq!(ValidationMiddleware::parse_part_number("1"), Some(1));
        assert_eq!(ValidationMiddleware::parse_part_number("10000"), Some(10_000));
        assert_eq!(ValidationMiddleware::parse_part_number("0"), None);
        assert_eq!(ValidationMiddleware::parse_part_number("10001"), None);
        assert_eq!(ValidationMiddleware::parse_part_number("two"), None);
    }
}
