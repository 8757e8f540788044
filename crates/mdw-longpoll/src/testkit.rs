//! Replaying transport for tests. Compiled only under `cfg(test)` or the
//! `testkit` feature; MUST NOT be enabled in production builds.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::{AttributeRequest, AttributeResponse, ETag, MetadataTransport, TransportError};

/// Status returned once the script runs out.
pub const EXHAUSTED_STATUS: u16 = 400;

type Reply = Result<AttributeResponse, TransportError>;

#[derive(Debug)]
enum Step {
    Once(Reply),
    Forever(Reply),
}

/// What the watcher sent, captured per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub key: String,
    pub last_etag: Option<String>,
    pub timeout_hint_secs: Option<u64>,
    pub request_timeout: Option<Duration>,
}

/// Scripted [`MetadataTransport`]: replays queued replies in order and
/// records every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call (simulates a held long poll).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn respond(self, etag: Option<&str>, body: &str) -> Self {
        self.push(Step::Once(Ok(response(etag, body))))
    }

    /// Reply with this response to every remaining call.
    pub fn respond_forever(self, etag: Option<&str>, body: &str) -> Self {
        self.push(Step::Forever(Ok(response(etag, body))))
    }

    pub fn fail(self, code: u16) -> Self {
        self.push(Step::Once(Err(status(code, "scripted"))))
    }

    pub fn fail_forever(self, code: u16) -> Self {
        self.push(Step::Forever(Err(status(code, "scripted"))))
    }

    pub fn fail_with(self, err: TransportError) -> Self {
        self.push(Step::Once(Err(err)))
    }

    /// Queue more replies on a shared transport (e.g. between loop runs).
    pub fn enqueue(&self, etag: Option<&str>, body: &str) {
        self.lock_steps()
            .push_back(Step::Once(Ok(response(etag, body))));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn push(self, step: Step) -> Self {
        self.lock_steps().push_back(step);
        self
    }

    fn lock_steps(&self) -> std::sync::MutexGuard<'_, VecDeque<Step>> {
        self.steps.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MetadataTransport for ScriptedTransport {
    fn fetch(&self, req: &AttributeRequest<'_>) -> Result<AttributeResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedRequest {
                key: req.key.as_str().to_string(),
                last_etag: req.last_etag.map(|e| e.as_str().to_string()),
                timeout_hint_secs: req.timeout_hint_secs,
                request_timeout: req.request_timeout,
            });

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let mut steps = self.lock_steps();
        match steps.front() {
            Some(Step::Forever(reply)) => reply.clone(),
            Some(Step::Once(_)) => match steps.pop_front() {
                Some(Step::Once(reply)) => reply,
                _ => Err(status(EXHAUSTED_STATUS, "script exhausted")),
            },
            None => Err(status(EXHAUSTED_STATUS, "script exhausted")),
        }
    }
}

fn response(etag: Option<&str>, body: &str) -> AttributeResponse {
    AttributeResponse {
        etag: etag.map(ETag::new),
        body: body.to_string(),
    }
}

fn status(code: u16, reason: &str) -> TransportError {
    TransportError::Status {
        code,
        reason: reason.to_string(),
    }
}
