//! Request builders for tests

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, Method},
};
use serde::Serialize;

use crate::request::Request;

/// Fluent builder producing either a pipeline [`Request`] or an axum request
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
}

impl TestRequest {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn options(uri: &str) -> Self {
        Self::new(Method::OPTIONS, uri)
    }

    /// Add a header; panics on invalid input since this is test-only
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::from_bytes(name.as_bytes()).expect("valid header name");
        let value = HeaderValue::from_str(value).expect("valid header value");
        self.headers.insert(name, value);
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", &format!("Bearer {}", token))
    }

    pub fn client_ip(self, ip: &str) -> Self {
        self.header("x-forwarded-for", ip)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn json<T: Serialize>(self, value: &T) -> Self {
        let body = serde_json::to_vec(value).expect("serializable test body");
        self.header("content-type", "application/json").body(body)
    }

    /// Pipeline request for driving the executor directly
    pub fn build(self) -> Request {
        let uri = self.uri.parse().expect("valid test uri");
        Request::new(self.method, uri, self.headers).with_body(self.body)
    }

    /// axum request for `tower::ServiceExt::oneshot`
    pub fn into_axum(self) -> axum::extract::Request {
        let mut builder = axum::http::Request::builder()
            .method(self.method)
            .uri(self.uri);
        if let Some(headers) = builder.headers_mut() {
            *headers = self.headers;
        }
        builder
            .body(Body::from(self.body))
            .expect("valid test request")
    }
}
