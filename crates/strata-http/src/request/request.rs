//! Inbound request data handed to the pipeline

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, Uri},
};
use serde::de::DeserializeOwned;

use crate::errors::{HttpError, HttpResult};
use crate::foundation::{HEADER_AUTHORIZATION, HEADER_FORWARDED_FOR, HEADER_REAL_IP};

/// Request data owned by a [`RequestContext`](crate::pipeline::RequestContext)
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub path_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Create a request; query parameters are parsed from the URI
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        let query_params = uri
            .query()
            .and_then(|q| serde_urlencoded::from_str::<HashMap<String, String>>(q).ok())
            .unwrap_or_default();

        Self {
            method,
            uri,
            headers,
            path_params: HashMap::new(),
            query_params,
            body: Bytes::new(),
            remote_addr: None,
        }
    }

    /// Set path parameters extracted from route
    pub fn with_path_params(mut self, params: HashMap<String, String>) -> Self {
        self.path_params = params;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> HttpResult<T> {
        if self.body.is_empty() {
            return Err(HttpError::bad_request("Request body is empty"));
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| HttpError::bad_request(format!("Invalid JSON body: {}", e)))
    }

    /// Raw Authorization header
    pub fn authorization(&self) -> Option<&str> {
        self.header(HEADER_AUTHORIZATION)
    }

    /// Client IP from forwarding headers, falling back to the peer address
    pub fn client_ip(&self) -> Option<String> {
        if let Some(forwarded) = self.header(HEADER_FORWARDED_FOR) {
            if let Some(ip) = forwarded.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Some(ip.to_string());
                }
            }
        }

        if let Some(real_ip) = self.header(HEADER_REAL_IP) {
            return Some(real_ip.trim().to_string());
        }

        self.remote_addr.map(|addr| addr.ip().to_string())
    }
}
