//! # Request Context
//!
//! Per-request state threaded through every stage: the inbound [`Request`],
//! the traversal cursor, a string-keyed value store, the write-once response,
//! response headers, collected errors and the cancellation signal.
//!
//! A context is created by the executor when a request arrives, is exclusively
//! borrowed by whichever stage is running, and is consumed when the response
//! is produced. It is never shared between requests.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tokio_util::sync::CancellationToken;

use super::stage::Stage;
use crate::errors::HttpError;
use crate::request::Request;
use crate::response::{Response, ResponseBody};

type Value = Box<dyn Any + Send + Sync>;

/// Mutable per-request state shared by the stages of one traversal
pub struct RequestContext<'a> {
    request: Request,
    stages: &'a [Arc<dyn Stage>],
    terminal: &'a dyn Stage,
    /// Number of positions entered so far; `stages.len() + 1` once the terminal ran
    cursor: usize,
    aborted: bool,
    halted_at: Option<&'static str>,
    values: HashMap<String, Value>,
    response: Option<Response>,
    headers: HeaderMap,
    errors: Vec<String>,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl<'a> RequestContext<'a> {
    pub fn new(request: Request, stages: &'a [Arc<dyn Stage>], terminal: &'a dyn Stage) -> Self {
        Self {
            request,
            stages,
            terminal,
            cursor: 0,
            aborted: false,
            halted_at: None,
            values: HashMap::new(),
            response: None,
            headers: HeaderMap::new(),
            errors: Vec::new(),
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Invoke the next stage, or the terminal handler once every stage has been entered.
    ///
    /// Returns after that stage (and everything inward of it) has returned. A no-op
    /// once the context is aborted, halted, or the terminal has already run.
    pub fn next(&mut self) {
        if self.aborted || self.halted_at.is_some() {
            return;
        }

        let position = self.cursor;
        let stages = self.stages;

        if position < stages.len() {
            self.cursor += 1;
            let stage = &stages[position];
            stage.process(self);

            // Stage returned without advancing: everything inward is skipped
            if self.cursor == position + 1 && !self.aborted && self.halted_at.is_none() {
                self.halted_at = Some(stage.name());
            }
        } else if position == stages.len() {
            self.cursor += 1;
            let terminal = self.terminal;
            terminal.process(self);
        }
    }

    /// Write the response (if not yet written) and stop inward traversal.
    ///
    /// The calling stage's own remaining code still runs.
    pub fn abort(&mut self, status: StatusCode, body: impl Into<ResponseBody>) {
        self.write_response(status, body);
        self.aborted = true;
    }

    /// Abort with an empty body
    pub fn abort_with_status(&mut self, status: StatusCode) {
        self.abort(status, ResponseBody::Empty);
    }

    /// Abort with a fully built response
    pub fn abort_with_response(&mut self, response: Response) {
        self.respond(response);
        self.aborted = true;
    }

    /// Replace any written response and abort. Only panic recovery may override write-once.
    pub(crate) fn abort_replacing_response(&mut self, response: Response) {
        self.response = Some(response);
        self.aborted = true;
    }

    /// Abort with the uniform JSON error body for `error`
    pub fn abort_with_error(&mut self, error: HttpError) {
        self.push_error(error.to_string());
        self.abort_with_response(error.to_response());
    }

    /// Set the response unless one is already written. Returns whether this call wrote it.
    pub fn write_response(&mut self, status: StatusCode, body: impl Into<ResponseBody>) -> bool {
        self.respond(Response::from_parts(status, body))
    }

    /// Set a fully built response unless one is already written
    pub fn respond(&mut self, response: Response) -> bool {
        if self.response.is_some() {
            return false;
        }
        self.response = Some(response);
        true
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn is_written(&self) -> bool {
        self.response.is_some()
    }

    /// Whether a stage returned without calling `next()`
    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    /// Name of the stage that returned without calling `next()`
    pub fn halted_at(&self) -> Option<&'static str> {
        self.halted_at
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Status the request will finish with if nothing else is written
    pub fn response_status(&self) -> StatusCode {
        self.response
            .as_ref()
            .map(Response::status)
            .unwrap_or(StatusCode::OK)
    }

    /// Current cursor position
    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn set<V>(&mut self, key: impl Into<String>, value: V)
    where
        V: Any + Send + Sync,
    {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Typed lookup; `None` when missing or stored with another type
    pub fn get<V: Any>(&self, key: &str) -> Option<&V> {
        self.values.get(key).and_then(|v| v.downcast_ref::<V>())
    }

    pub fn get_mut<V: Any>(&mut self, key: &str) -> Option<&mut V> {
        self.values.get_mut(key).and_then(|v| v.downcast_mut::<V>())
    }

    /// String lookup accepting both `String` and `&'static str` values
    pub fn get_str(&self, key: &str) -> Option<&str> {
        let value = self.values.get(key)?;
        value
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| value.downcast_ref::<&'static str>().copied())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Set a response header. These stay writable during unwind and are merged
    /// into the final response.
    pub fn set_header(&mut self, name: &str, value: &str) -> bool {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
                true
            }
            _ => {
                tracing::warn!(header = name, "ignoring invalid response header");
                false
            }
        }
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancelled explicitly or past the deadline
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Consume the context into the final response.
    ///
    /// Nothing written means `200 OK` with an empty body. Stage headers are
    /// merged over the response either way.
    pub(crate) fn into_response(self) -> Response {
        let mut response = self.response.unwrap_or_default();
        response.merge_headers(self.headers);
        response
    }
}

impl fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.request.method)
            .field("path", &self.request.path())
            .field("cursor", &self.cursor)
            .field("stages", &self.stages.len())
            .field("aborted", &self.aborted)
            .field("halted_at", &self.halted_at)
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .field("written", &self.response.is_some())
            .finish()
    }
}
