//! # Object Store Capability
//!
//! The handlers depend on this minimal interface rather than on an R2 binding
//! directly. Production wires in [`r2::R2Store`]; tests use an in-memory store.
//!
//! Worker bindings wrap single-threaded JS handles, so the traits are `?Send`.

use async_trait::async_trait;

use crate::errors::StoreResult;
use crate::models::{CompletedPart, ListedObject, ObjectMetadata, ObjectStream, StoredObject};

#[cfg(test)]
pub mod memory;
pub mod r2;

#[async_trait(?Send)]
pub trait ObjectStore {
    type Upload: MultipartUpload;

    /// Lists up to `limit` objects whose key starts with `prefix`.
    async fn list(&self, prefix: &str, limit: u32) -> StoreResult<Vec<ListedObject>>;

    /// Reads an object's metadata, `None` when the key is absent.
    async fn head(&self, key: &str) -> StoreResult<Option<ObjectMetadata>>;

    /// Opens an object for reading, `None` when the key is absent. The
    /// content arrives as a stream.
    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>>;

    /// Writes `length` bytes from `body` under `key`, replacing any existing
    /// object.
    async fn put(
        &self,
        key: &str,
        body: ObjectStream,
        length: u64,
        metadata: ObjectMetadata,
    ) -> StoreResult<()>;

    /// Removes an object. Expected to succeed for absent keys.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Opens a multipart upload and returns its upload id.
    async fn create_multipart_upload(
        &self,
        key: &str,
        metadata: ObjectMetadata,
    ) -> StoreResult<String>;

    /// Builds a handle to an existing multipart upload without contacting
    /// the store.
    fn resume_multipart_upload(&self, key: &str, upload_id: &str) -> StoreResult<Self::Upload>;
}

#[async_trait(?Send)]
pub trait MultipartUpload {
    /// Uploads one part and returns its etag.
    async fn upload_part(&self, part_number: u16, data: Vec<u8>) -> StoreResult<String>;

    /// Commits the upload from `parts` and returns the object's etag.
    async fn complete(self, parts: Vec<CompletedPart>) -> StoreResult<String>;

    /// Discards the upload and any uploaded parts.
    async fn abort(&self) -> StoreResult<()>;
}
