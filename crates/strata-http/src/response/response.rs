//! Response abstraction produced by the pipeline
//!
//! Handlers and aborting stages write a [`Response`]; the executor merges stage
//! headers into it and the axum bridge serializes it.

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;

use crate::foundation::{CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT, HEADER_CONTENT_TYPE};

/// HTTP response written by a handler or an aborting stage
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

/// Response body types
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Text(String),
    Json(serde_json::Value),
    Bytes(Bytes),
}

impl ResponseBody {
    pub fn is_empty(&self) -> bool {
        match self {
            ResponseBody::Empty => true,
            ResponseBody::Text(text) => text.is_empty(),
            ResponseBody::Json(_) => false,
            ResponseBody::Bytes(bytes) => bytes.is_empty(),
        }
    }

    /// Text view of the body, if it is text or JSON
    pub fn as_text(&self) -> Option<String> {
        match self {
            ResponseBody::Text(text) => Some(text.clone()),
            ResponseBody::Json(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Serialized body bytes
    pub fn to_bytes(&self) -> Bytes {
        match self {
            ResponseBody::Empty => Bytes::new(),
            ResponseBody::Text(text) => Bytes::from(text.clone()),
            ResponseBody::Json(value) => Bytes::from(value.to_string()),
            ResponseBody::Bytes(bytes) => bytes.clone(),
        }
    }
}

impl From<&str> for ResponseBody {
    fn from(text: &str) -> Self {
        ResponseBody::Text(text.to_string())
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        ResponseBody::Text(text)
    }
}

impl From<serde_json::Value> for ResponseBody {
    fn from(value: serde_json::Value) -> Self {
        ResponseBody::Json(value)
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        ResponseBody::Bytes(bytes)
    }
}

impl From<()> for ResponseBody {
    fn from(_: ()) -> Self {
        ResponseBody::Empty
    }
}

impl Response {
    /// Create new response with OK status and an empty body
    pub fn new() -> Self {
        Self::with_status(StatusCode::OK)
    }

    /// Create response with specific status code
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
        }
    }

    /// Create response from a status and body
    pub fn from_parts(status: StatusCode, body: impl Into<ResponseBody>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Add header to response, ignoring names or values that are not valid HTTP
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "ignoring invalid response header"),
        }
        self
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Set text body
    pub fn text<S: Into<String>>(mut self, text: S) -> Self {
        self.body = ResponseBody::Text(text.into());
        self
    }

    /// Set raw bytes body
    pub fn bytes(mut self, bytes: Bytes) -> Self {
        self.body = ResponseBody::Bytes(bytes);
        self
    }

    /// Set JSON body from a value
    pub fn json_value(mut self, value: serde_json::Value) -> Self {
        self.body = ResponseBody::Json(value);
        self
    }

    /// Set JSON body from any serializable type.
    ///
    /// A value that cannot be serialized turns the response into a 500.
    pub fn json<T: Serialize>(self, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => self.json_value(value),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                Response::with_status(StatusCode::INTERNAL_SERVER_ERROR).json_value(json!({
                    "error": {
                        "code": "INTERNAL_ERROR",
                        "message": "Response serialization failed",
                    }
                }))
            }
        }
    }

    /// Merge `extra` into this response's headers; `extra` wins on conflicts
    pub(crate) fn merge_headers(&mut self, extra: HeaderMap) {
        let mut last_name = None;
        for (name, value) in extra {
            // HeaderMap yields None for repeated values of the previous name
            match name {
                Some(name) => {
                    self.headers.insert(name.clone(), value);
                    last_name = Some(name);
                }
                None => {
                    if let Some(name) = &last_name {
                        self.headers.append(name.clone(), value);
                    }
                }
            }
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for Response {
    fn into_response(mut self) -> axum::response::Response {
        if !self.headers.contains_key(HEADER_CONTENT_TYPE) {
            let content_type = match &self.body {
                ResponseBody::Json(_) => Some(CONTENT_TYPE_JSON),
                ResponseBody::Text(_) => Some(CONTENT_TYPE_TEXT),
                _ => None,
            };
            if let Some(content_type) = content_type {
                self.headers.insert(
                    axum::http::header::CONTENT_TYPE,
                    HeaderValue::from_static(content_type),
                );
            }
        }

        let body = match self.body {
            ResponseBody::Empty => Body::empty(),
            ResponseBody::Text(text) => Body::from(text),
            ResponseBody::Json(value) => Body::from(value.to_string()),
            ResponseBody::Bytes(bytes) => Body::from(bytes),
        };

        let mut response = axum::response::Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
