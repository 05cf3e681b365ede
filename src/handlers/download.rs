//! Serves an upload as an attachment so browsers save it instead of rendering
//! it inline. The object body is streamed through; it is never held in
//! memory as a whole.

use crate::constants::DEFAULT_CONTENT_TYPE;
use crate::errors::{AppError, AppResult};
use crate::middleware::ValidationMiddleware;
use crate::response::ApiResponse;
use crate::store::ObjectStore;
use crate::utils::{attachment_disposition, last_path_segment};

pub async fn download_file<S: ObjectStore>(store: &S, key: Option<String>) -> AppResult<ApiResponse> {
    let key = ValidationMiddleware::present(key)
        .ok_or_else(|| AppError::Validation("No file key provided".to_string()))?;

    ValidationMiddleware::validate_upload_key(&key)?;

    let object = store
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let file_name = object
        .metadata
        .original_name()
        .unwrap_or_else(|| last_path_segment(&key))
        .to_string();
    let content_type = object
        .metadata
        .content_type()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    Ok(ApiResponse::stream(object.body)
        .with_header("Content-Type", content_type)
        .with_header("Content-Disposition", attachment_disposition(&file_name))
        .with_header("Content-Length", object.size.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::META_ORIGINAL_NAME;
    use crate::models::ObjectMetadata;
    use crate::response::ResponseBody;
    use crate::store::memory::MemoryStore;
    use chrono::Utc;
    use futures::executor::block_on;
    use futures::TryStreamExt;
    use http::StatusCode;
    use std::collections::HashMap;

    fn streamed_body(response: ApiResponse) -> Vec<Vec<u8>> {
        match response.body {
            ResponseBody::Stream(body) => block_on(body.try_collect()).unwrap(),
            other => panic!("expected a streamed body, got {other:?}"),
        }
    }

    #[test]
    fn serves_object_as_attachment() {
        let store = MemoryStore::new();
        let metadata = ObjectMetadata {
            content_type: Some("text/x-python".into()),
            custom: HashMap::from([(META_ORIGINAL_NAME.to_string(), "my script.py".to_string())]),
        };
        store.insert("uploads/1-my_script.py", b"print(1)", metadata, Utc::now());

        let response = block_on(download_file(&store, Some("uploads/1-my_script.py".into()))).unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("Content-Type"), Some("text/x-python"));
        assert_eq!(
            response.header("Content-Disposition"),
            Some("attachment; filename=\"my%20script.py\"")
        );
        assert_eq!(response.header("Content-Length"), Some("8"));
        assert_eq!(streamed_body(response).concat(), b"print(1)");
    }

    #[test]
    fn body_is_passed_through_in_chunks() {
        let store = MemoryStore::new();
        let content = vec![7u8; 4096];
        store.insert("uploads/big.bin", &content, ObjectMetadata::default(), Utc::now());

        let response = block_on(download_file(&store, Some("uploads/big.bin".into()))).unwrap();

        assert_eq!(response.header("Content-Type"), Some(DEFAULT_CONTENT_TYPE));
        assert_eq!(response.header("Content-Disposition"), Some("attachment; filename=\"big.bin\""));
        let chunks = streamed_body(response);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), content);
    }

    #[test]
    fn missing_object_is_not_found() {
        let store = MemoryStore::new();

        let err = block_on(download_file(&store, Some("uploads/nope.txt".into()))).unwrap_err();

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "File not found");
    }

    #[test]
    fn key_is_required_and_confined() {
        let store = MemoryStore::new();

        let err = block_on(download_file(&store, None)).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = block_on(download_file(&store, Some("secrets/config.json".into()))).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
