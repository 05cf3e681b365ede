//! In-memory [`ObjectStore`] used by the handler tests. Records every
//! mutating call and supports injected failures.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};

use super::{MultipartUpload, ObjectStore};
use crate::errors::{StoreError, StoreResult};
use crate::models::{CompletedPart, ListedObject, ObjectMetadata, ObjectStream, StoredObject};

/// Chunk size used when streaming stored bodies back out.
const CHUNK_SIZE: usize = 4;

#[derive(Clone, Debug)]
pub struct MemoryObject {
    pub body: Vec<u8>,
    pub metadata: ObjectMetadata,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Session {
    pub metadata: ObjectMetadata,
    pub parts: BTreeMap<u16, Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct MemoryState {
    pub objects: BTreeMap<String, MemoryObject>,
    pub sessions: HashMap<(String, String), Session>,
    pub next_upload: u32,
    pub list_calls: Vec<(String, u32)>,
    pub head_calls: Vec<String>,
    pub get_calls: Vec<String>,
    pub put_calls: Vec<String>,
    pub delete_calls: Vec<String>,
    pub abort_calls: Vec<(String, String)>,
    pub list_error: Option<StoreError>,
    pub head_error: Option<StoreError>,
    pub put_error: Option<StoreError>,
    pub delete_error: Option<StoreError>,
    pub abort_error: Option<StoreError>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, body: &[u8], metadata: ObjectMetadata, last_modified: DateTime<Utc>) {
        self.state.borrow_mut().objects.insert(
            key.to_string(),
            MemoryObject {
                body: body.to_vec(),
                metadata,
                last_modified,
            },
        );
    }

    pub fn state(&self) -> std::cell::RefMut<'_, MemoryState> {
        self.state.borrow_mut()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.borrow().objects.contains_key(key)
    }

    pub fn object_body(&self, key: &str) -> Option<Vec<u8>> {
        self.state.borrow().objects.get(key).map(|object| object.body.clone())
    }

    pub fn object_metadata(&self, key: &str) -> Option<ObjectMetadata> {
        self.state
            .borrow()
            .objects
            .get(key)
            .map(|object| object.metadata.clone())
    }

    pub fn has_session(&self, key: &str, upload_id: &str) -> bool {
        self.state
            .borrow()
            .sessions
            .contains_key(&(key.to_string(), upload_id.to_string()))
    }
}

fn no_such_upload() -> StoreError {
    StoreError::NotFound("The specified multipart upload does not exist. (10024)".to_string())
}

#[async_trait(?Send)]
impl ObjectStore for MemoryStore {
    type Upload = MemoryUpload;

    async fn list(&self, prefix: &str, limit: u32) -> StoreResult<Vec<ListedObject>> {
        let mut state = self.state.borrow_mut();
        state.list_calls.push((prefix.to_string(), limit));
        if let Some(error) = state.list_error.clone() {
            return Err(error);
        }
        Ok(state
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .take(limit as usize)
            .map(|(key, object)| ListedObject {
                key: key.clone(),
                size: object.body.len() as u64,
                last_modified: object.last_modified,
            })
            .collect())
    }

    async fn head(&self, key: &str) -> StoreResult<Option<ObjectMetadata>> {
        let mut state = self.state.borrow_mut();
        state.head_calls.push(key.to_string());
        if let Some(error) = state.head_error.clone() {
            return Err(error);
        }
        Ok(state.objects.get(key).map(|object| object.metadata.clone()))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        let mut state = self.state.borrow_mut();
        state.get_calls.push(key.to_string());
        Ok(state.objects.get(key).map(|object| {
            let chunks: Vec<StoreResult<Vec<u8>>> = object
                .body
                .chunks(CHUNK_SIZE)
                .map(|chunk| Ok(chunk.to_vec()))
                .collect();
            StoredObject {
                size: object.body.len() as u64,
                metadata: object.metadata.clone(),
                body: stream::iter(chunks).boxed_local(),
            }
        }))
    }

    async fn put(
        &self,
        key: &str,
        body: ObjectStream,
        length: u64,
        metadata: ObjectMetadata,
    ) -> StoreResult<()> {
        {
            let mut state = self.state.borrow_mut();
            state.put_calls.push(key.to_string());
            if let Some(error) = state.put_error.clone() {
                return Err(error);
            }
        }

        let body: Vec<u8> = body.try_concat().await?;
        if body.len() as u64 != length {
            return Err(StoreError::Backend(format!(
                "stream length {} does not match declared length {}",
                body.len(),
                length
            )));
        }

        self.state.borrow_mut().objects.insert(
            key.to_string(),
            MemoryObject {
                body,
                metadata,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        state.delete_calls.push(key.to_string());
        if let Some(error) = state.delete_error.clone() {
            return Err(error);
        }
        state.objects.remove(key);
        Ok(())
    }

    async fn create_multipart_upload(
        &self,
        key: &str,
        metadata: ObjectMetadata,
    ) -> StoreResult<String> {
        let mut state = self.state.borrow_mut();
        state.next_upload += 1;
        let upload_id = format!("upload-{}", state.next_upload);
        state.sessions.insert(
            (key.to_string(), upload_id.clone()),
            Session {
                metadata,
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    fn resume_multipart_upload(&self, key: &str, upload_id: &str) -> StoreResult<MemoryUpload> {
        Ok(MemoryUpload {
            state: Rc::clone(&self.state),
            key: key.to_string(),
            upload_id: upload_id.to_string(),
        })
    }
}

pub struct MemoryUpload {
    state: Rc<RefCell<MemoryState>>,
    key: String,
    upload_id: String,
}

impl MemoryUpload {
    fn session_key(&self) -> (String, String) {
        (self.key.clone(), self.upload_id.clone())
    }
}

#[async_trait(?Send)]
impl MultipartUpload for MemoryUpload {
    async fn upload_part(&self, part_number: u16, data: Vec<u8>) -> StoreResult<String> {
        let mut state = self.state.borrow_mut();
        let session = state
            .sessions
            .get_mut(&self.session_key())
            .ok_or_else(no_such_upload)?;
        let etag = format!("etag-{}-{}", part_number, data.len());
        session.parts.insert(part_number, data);
        Ok(etag)
    }

    async fn complete(self, parts: Vec<CompletedPart>) -> StoreResult<String> {
        let mut state = self.state.borrow_mut();
        let session = state
            .sessions
            .remove(&self.session_key())
            .ok_or_else(no_such_upload)?;

        let mut body = Vec::new();
        for part in &parts {
            let data = session.parts.get(&part.part_number).ok_or_else(|| {
                StoreError::Backend(format!("part {} was never uploaded", part.part_number))
            })?;
            body.extend_from_slice(data);
        }

        let etag = format!("etag-complete-{}", parts.len());
        state.objects.insert(
            self.key.clone(),
            MemoryObject {
                body,
                metadata: session.metadata,
                last_modified: Utc::now(),
            },
        );
        Ok(etag)
    }

    async fn abort(&self) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        state.abort_calls.push(self.session_key());
        if let Some(error) = state.abort_error.clone() {
            return Err(error);
        }
        state
            .sessions
            .remove(&self.session_key())
            .map(|_| ())
            .ok_or_else(no_such_upload)
    }
}
