//! # Utility Functions
//!
//! Key generation, filename sanitizing and header value helpers shared by the
//! upload handlers.
//!
//! ## Key Layout
//!
//! ```text
//! uploads/{epochMillis}-{sanitizedName}
//! uploads/{uuid}_{name}                    (older uploads)
//! ```

use chrono::{DateTime, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use uuid::Uuid;

use crate::constants::{UNKNOWN_UPLOADER, UPLOAD_PREFIX};

/// Characters `encodeURIComponent` leaves untouched.
const URI_COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Returns the final `/`-separated segment of a key.
pub fn last_path_segment(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Builds the object key for a new upload started at `now`.
pub fn generate_upload_key(file_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}{}-{}",
        UPLOAD_PREFIX,
        now.timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

/// Cleans a user-chosen display name: path separators and characters
/// reserved in file names become `_`, surrounding whitespace is dropped.
pub fn sanitize_display_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Key for an upload renamed to `new_name`. The identifying stamp of
/// `old_key` is kept, either a `{uuid}_` or an `{epochMillis}-` lead; keys
/// carrying neither get a fresh stamp from `now`.
pub fn renamed_key(old_key: &str, new_name: &str, now: DateTime<Utc>) -> String {
    let file_name = last_path_segment(old_key);

    if let Some((id, _)) = file_name.split_once('_') {
        if Uuid::parse_str(id).is_ok() {
            return format!("{}{}_{}", UPLOAD_PREFIX, id, new_name);
        }
    }

    let stamp = match file_name.split_once('-') {
        Some((millis, _)) if !millis.is_empty() && millis.bytes().all(|b| b.is_ascii_digit()) => {
            millis.to_string()
        }
        _ => now.timestamp_millis().to_string(),
    };
    format!("{}{}-{}", UPLOAD_PREFIX, stamp, new_name)
}

/// Decodes a percent-encoded header value. Invalid UTF-8 is replaced lossily.
pub fn decode_header_value(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// `Content-Disposition` value forcing a download under `file_name`.
pub fn attachment_disposition(file_name: &str) -> String {
    format!(
        "attachment; filename=\"{}\"",
        utf8_percent_encode(file_name, URI_COMPONENT_ENCODE_SET)
    )
}

/// Picks the client address from `CF-Connecting-IP`, then the first
/// `X-Forwarded-For` hop.
pub fn client_address(connecting_ip: Option<String>, forwarded_for: Option<String>) -> String {
    connecting_ip
        .filter(|ip| !ip.trim().is_empty())
        .or_else(|| {
            forwarded_for.and_then(|value| {
                value
                    .split(',')
                    .next()
                    .map(|hop| hop.trim().to_string())
                    .filter(|hop| !hop.is_empty())
            })
        })
        .unwrap_or_else(|| UNKNOWN_UPLOADER.to_string())
}
