//! # Response Envelope
//!
//! Handlers produce an [`ApiResponse`], a plain value independent of the
//! Workers runtime, so that every handler can be exercised natively. The
//! router converts it into a `worker::Response` at the edge.

use std::fmt;

use futures::TryStreamExt;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use worker::{Error as WorkerError, Response};

use crate::errors::{AppError, AppResult};
use crate::models::ObjectStream;

pub enum ResponseBody {
    Empty,
    Json(Value),
    /// Object content, handed to the runtime chunk by chunk.
    Stream(ObjectStream),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Empty => f.write_str("Empty"),
            ResponseBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
    pub headers: Vec<(&'static str, String)>,
}

impl ApiResponse {
    pub fn json(status: StatusCode, value: Value) -> Self {
        Self {
            status,
            body: ResponseBody::Json(value),
            headers: vec![("Content-Type", "application/json".to_string())],
        }
    }

    /// Serializes `payload` as a 200 JSON response.
    pub fn ok<T: Serialize>(payload: &T) -> AppResult<Self> {
        let value = serde_json::to_value(payload)
            .map_err(|e| AppError::Internal(format!("Failed to serialize response: {}", e)))?;
        Ok(Self::json(StatusCode::OK, value))
    }

    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            body: ResponseBody::Empty,
            headers: Vec::new(),
        }
    }

    pub fn stream(body: ObjectStream) -> Self {
        Self {
            status: StatusCode::OK,
            body: ResponseBody::Stream(body),
            headers: Vec::new(),
        }
    }

    /// Sets a header, replacing any previous value with the same name.
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_worker(self) -> worker::Result<Response> {
        let response = match self.body {
            ResponseBody::Empty => Response::empty()?,
            ResponseBody::Json(value) => Response::from_json(&value)?,
            ResponseBody::Stream(body) => Response::from_stream(body.map_err(WorkerError::from))?,
        };
        let mut response = response.with_status(self.status.as_u16());
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            headers.set(name, value)?;
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_header_replaces_case_insensitively() {
        let response = ApiResponse::empty()
            .with_header("Content-Type", "text/plain")
            .with_header("content-type", "image/png");
        assert_eq!(response.headers.len(), 1);
        assert_eq!(response.header("CONTENT-TYPE"), Some("image/png"));
    }

    #[test]
    fn json_responses_declare_content_type() {
        let response = ApiResponse::ok(&json!({ "success": true })).unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
    }
}
