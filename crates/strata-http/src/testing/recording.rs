//! Stages that journal their entry and exit, for asserting traversal order

use std::sync::{Arc, Mutex};

use axum::http::StatusCode;

use crate::pipeline::{RequestContext, Stage};
use crate::response::Response;

/// Shared, ordered journal of pipeline events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.into());
        }
    }

    /// Snapshot of all events so far
    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.count(event) > 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

/// Records `enter:<name>` and `exit:<name>` around `next()`, or aborts when configured to
#[derive(Debug, Clone)]
pub struct RecordingStage {
    name: &'static str,
    log: EventLog,
    abort_with: Option<(StatusCode, String)>,
}

impl RecordingStage {
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
            abort_with: None,
        }
    }

    /// Abort instead of calling `next()`; the exit is still recorded
    pub fn aborting(name: &'static str, log: &EventLog, status: StatusCode, body: &str) -> Self {
        Self {
            name,
            log: log.clone(),
            abort_with: Some((status, body.to_string())),
        }
    }
}

impl Stage for RecordingStage {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        self.log.record(format!("enter:{}", self.name));
        match &self.abort_with {
            Some((status, body)) => ctx.abort(*status, body.clone()),
            None => ctx.next(),
        }
        self.log.record(format!("exit:{}", self.name));
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Terminal handler that records `handler` and answers `200 ok`
#[derive(Debug, Clone)]
pub struct RecordingHandler {
    log: EventLog,
}

impl RecordingHandler {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl Stage for RecordingHandler {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        self.log.record("handler");
        ctx.respond(Response::ok().text("ok"));
    }

    fn name(&self) -> &'static str {
        "RecordingHandler"
    }
}
