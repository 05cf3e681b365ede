use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream::LocalBoxStream;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONTENT_TYPE, META_ORIGINAL_NAME, META_SIZE, META_UPLOADED_AT, META_UPLOADER_ADDRESS,
    META_UPLOADER_IP, UNKNOWN_UPLOADER,
};
use crate::errors::StoreResult;
use crate::utils::last_path_segment;

/// Object content as a chunked byte stream. Never buffered as a whole.
pub type ObjectStream = LocalBoxStream<'static, StoreResult<Vec<u8>>>;

/// One entry of a store listing.
#[derive(Clone, Debug, PartialEq)]
pub struct ListedObject {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Metadata attached to a stored object or a pending multipart upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
    pub custom: HashMap<String, String>,
}

impl ObjectMetadata {
    fn custom_value(&self, name: &str) -> Option<&str> {
        self.custom
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn original_name(&self) -> Option<&str> {
        self.custom_value(META_ORIGINAL_NAME)
    }

    /// Declared size; zero and unparsable values count as absent.
    pub fn declared_size(&self) -> Option<u64> {
        self.custom_value(META_SIZE)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|size| *size > 0)
    }

    /// Recorded upload time as stored, with its parsed instant. Values that
    /// do not parse as RFC 3339 count as absent.
    pub fn uploaded_at(&self) -> Option<(&str, DateTime<Utc>)> {
        let raw = self.custom_value(META_UPLOADED_AT)?;
        let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
        Some((raw, parsed.with_timezone(&Utc)))
    }

    pub fn uploader_address(&self) -> Option<&str> {
        self.custom_value(META_UPLOADER_IP)
            .or_else(|| self.custom_value(META_UPLOADER_ADDRESS))
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref().filter(|value| !value.is_empty())
    }
}

/// A fetched object with its streamed content.
pub struct StoredObject {
    pub size: u64,
    pub metadata: ObjectMetadata,
    pub body: ObjectStream,
}

/// Part reference used to complete a multipart upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPart {
    pub part_number: u16,
    pub etag: String,
}

/// A listed upload as presented to clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub key: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub uploaded_at: String,
    pub uploader_address: String,
    pub url: String,
    /// Instant behind `uploaded_at`, used for ordering.
    #[serde(skip)]
    pub uploaded_instant: DateTime<Utc>,
}

impl FileRecord {
    /// Merges a listing entry with its (possibly absent) stored metadata.
    pub fn from_listing(object: ListedObject, metadata: Option<ObjectMetadata>, url: String) -> Self {
        let metadata = metadata.unwrap_or_default();
        let (uploaded_at, uploaded_instant) = match metadata.uploaded_at() {
            Some((raw, instant)) => (raw.to_string(), instant),
            None => (
                object.last_modified.to_rfc3339_opts(SecondsFormat::Millis, true),
                object.last_modified,
            ),
        };
        Self {
            name: metadata
                .original_name()
                .map(str::to_string)
                .unwrap_or_else(|| last_path_segment(&object.key).to_string()),
            size: metadata.declared_size().unwrap_or(object.size),
            content_type: metadata
                .content_type()
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
            uploaded_at,
            uploaded_instant,
            uploader_address: metadata
                .uploader_address()
                .unwrap_or(UNKNOWN_UPLOADER)
                .to_string(),
            url,
            key: object.key,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub files: Vec<FileRecord>,
    pub count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortRequest {
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Header-derived input of the multipart start endpoint.
#[derive(Debug, Default)]
pub struct StartRequest {
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub uploader_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub success: bool,
    pub upload_id: String,
    pub key: String,
    pub file_name: String,
}

/// Header-derived input of the part upload endpoint.
#[derive(Debug, Default)]
pub struct PartRequest {
    pub upload_id: Option<String>,
    pub key: Option<String>,
    pub part_number: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartResponse {
    pub success: bool,
    pub part_number: u16,
    pub etag: String,
    pub size: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub parts: Option<Vec<CompletedPart>>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub success: bool,
    pub key: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub url: String,
    pub etag: String,
}

/// Header-derived input of the single-shot upload endpoint.
#[derive(Debug, Default)]
pub struct UploadRequest {
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub uploader_address: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub key: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub new_name: Option<String>,
}

/// Rename outcome. An unchanged name echoes `key`; a move reports `oldKey`
/// and the new public `url`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_key: Option<String>,
    pub new_key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
