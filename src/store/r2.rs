//! # R2 Object Store
//!
//! [`ObjectStore`] backed by a Cloudflare R2 bucket binding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use worker::{Bucket, Env, Error as WorkerError, FixedLengthStream, HttpMetadata, Object, UploadedPart};

use super::{MultipartUpload, ObjectStore};
use crate::errors::{StoreError, StoreResult};
use crate::models::{CompletedPart, ListedObject, ObjectMetadata, ObjectStream, StoredObject};

pub struct R2Store {
    bucket: Bucket,
}

impl R2Store {
    pub fn new(bucket: Bucket) -> Self {
        Self { bucket }
    }

    /// Resolves the bucket binding named `binding` from the worker environment.
    pub fn from_env(env: &Env, binding: &str) -> worker::Result<Self> {
        Ok(Self::new(env.bucket(binding)?))
    }
}

fn uploaded_at(object: &Object) -> DateTime<Utc> {
    let millis = object.uploaded().as_millis();
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

fn metadata_of(object: &Object) -> StoreResult<ObjectMetadata> {
    Ok(ObjectMetadata {
        content_type: object.http_metadata().content_type,
        custom: object.custom_metadata()?,
    })
}

#[async_trait(?Send)]
impl ObjectStore for R2Store {
    type Upload = R2MultipartUpload;

    async fn list(&self, prefix: &str, limit: u32) -> StoreResult<Vec<ListedObject>> {
        let listed = self
            .bucket
            .list()
            .prefix(prefix.to_string())
            .limit(limit)
            .execute()
            .await?;

        Ok(listed
            .objects()
            .iter()
            .map(|object| ListedObject {
                key: object.key(),
                size: object.size(),
                last_modified: uploaded_at(object),
            })
            .collect())
    }

    async fn head(&self, key: &str) -> StoreResult<Option<ObjectMetadata>> {
        match self.bucket.head(key.to_string()).await? {
            Some(object) => Ok(Some(metadata_of(&object)?)),
            None => Ok(None),
        }
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        let Some(object) = self.bucket.get(key.to_string()).execute().await? else {
            return Ok(None);
        };

        let metadata = metadata_of(&object)?;
        let body: ObjectStream = match object.body() {
            Some(body) => body.stream()?.map_err(StoreError::from).boxed_local(),
            None => stream::empty().boxed_local(),
        };

        Ok(Some(StoredObject {
            size: object.size(),
            metadata,
            body,
        }))
    }

    async fn put(
        &self,
        key: &str,
        body: ObjectStream,
        length: u64,
        metadata: ObjectMetadata,
    ) -> StoreResult<()> {
        let http_metadata = HttpMetadata {
            content_type: metadata.content_type,
            ..Default::default()
        };
        let body = FixedLengthStream::wrap(body.map_err(WorkerError::from), length);

        self.bucket
            .put(key.to_string(), body)
            .http_metadata(http_metadata)
            .custom_metadata(metadata.custom)
            .execute()
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.bucket.delete(key.to_string()).await?;
        Ok(())
    }

    async fn create_multipart_upload(
        &self,
        key: &str,
        metadata: ObjectMetadata,
    ) -> StoreResult<String> {
        let http_metadata = HttpMetadata {
            content_type: metadata.content_type,
            ..Default::default()
        };

        let upload = self
            .bucket
            .create_multipart_upload(key.to_string())
            .http_metadata(http_metadata)
            .custom_metadata(metadata.custom)
            .execute()
            .await?;

        Ok(upload.upload_id().await)
    }

    fn resume_multipart_upload(&self, key: &str, upload_id: &str) -> StoreResult<R2MultipartUpload> {
        let upload = self
            .bucket
            .resume_multipart_upload(key.to_string(), upload_id.to_string())?;
        Ok(R2MultipartUpload { upload })
    }
}

pub struct R2MultipartUpload {
    upload: worker::MultipartUpload,
}

#[async_trait(?Send)]
impl MultipartUpload for R2MultipartUpload {
    async fn upload_part(&self, part_number: u16, data: Vec<u8>) -> StoreResult<String> {
        let part = self.upload.upload_part(part_number, data).await?;
        Ok(part.etag())
    }

    async fn complete(self, parts: Vec<CompletedPart>) -> StoreResult<String> {
        let parts = parts
            .into_iter()
            .map(|part| UploadedPart::new(part.part_number, part.etag));
        let object = self
            .upload
            .complete(parts)
            .await
            .map_err(StoreError::from)?;
        Ok(object.etag())
    }

    async fn abort(&self) -> StoreResult<()> {
        self.upload.abort().await?;
        Ok(())
    }
}
