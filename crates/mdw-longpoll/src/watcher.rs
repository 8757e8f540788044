use std::time::Duration;

use mdw_config::DEFAULT_RETRY_DELAY_SECS;
use tracing::{info, warn};

use crate::{
    AttributeRequest, AttributeResponse, ETag, MetadataKey, MetadataTransport, WaitContext,
    WaitOutcome, WatchError, WatchSession, REQUEST_TIMEOUT_SLACK,
};

/// Long-poll client for one metadata attribute.
///
/// Owns the last accepted etag across waits. A wait returns only when the
/// etag moved *and* the value is non-empty, or when its timeout elapsed.
#[derive(Debug)]
pub struct MetadataWatcher<T> {
    transport: T,
    etag: Option<ETag>,
    retry_delay: Duration,
}

impl<T: MetadataTransport> MetadataWatcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            etag: None,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }

    /// Seed the etag, e.g. to skip the value the caller has already seen.
    pub fn with_etag(mut self, etag: Option<ETag>) -> Self {
        self.etag = etag;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn etag(&self) -> Option<&ETag> {
        self.etag.as_ref()
    }

    /// Forget the accepted etag; the next wait answers with the current value.
    pub fn reset_etag(&mut self) -> Option<ETag> {
        self.etag.take()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Block until `key` changes to a non-empty value or `timeout` elapses.
    ///
    /// `timeout` of `None` (or zero) waits forever, bounded only by `ctx`.
    /// On timeout the most recently read value is returned (possibly empty)
    /// with `timed_out = true`.
    pub fn wait(
        &mut self,
        key: &MetadataKey,
        timeout: Option<Duration>,
        ctx: &WaitContext,
    ) -> Result<WaitOutcome, WatchError> {
        let mut session = WatchSession::start(self.etag.take(), timeout);
        let result = self.wait_in_session(key, &mut session, ctx);
        self.etag = session.etag;
        result
    }

    fn wait_in_session(
        &self,
        key: &MetadataKey,
        session: &mut WatchSession,
        ctx: &WaitContext,
    ) -> Result<WaitOutcome, WatchError> {
        let mut last_value = String::new();
        loop {
            if session.is_expired() {
                info!(key = %key, "wait for \"{}\" timed out", key);
                return Ok(WaitOutcome::timed_out(last_value));
            }

            let resp = self.send_request(key, session, ctx)?;

            let etag_updated = match resp.etag {
                Some(etag) if session.etag.as_ref() != Some(&etag) => {
                    session.etag = Some(etag);
                    true
                }
                _ => false,
            };
            last_value = resp.body;

            if !etag_updated {
                info!(key = %key, "retry due to no update of value of \"{}\"", key);
            } else if last_value.is_empty() {
                info!(key = %key, "retry due to empty value of \"{}\"", key);
            } else {
                info!(key = %key, etag = ?session.etag, "the latest value of \"{}\" is {}", key, last_value);
                return Ok(WaitOutcome::changed(last_value));
            }
        }
    }

    /// One successful response, absorbing retryable failures while the
    /// session is still open.
    fn send_request(
        &self,
        key: &MetadataKey,
        session: &WatchSession,
        ctx: &WaitContext,
    ) -> Result<AttributeResponse, WatchError> {
        loop {
            ctx.check()?;

            let timeout_hint_secs = session.timeout_hint_secs();
            let req = AttributeRequest {
                key,
                last_etag: session.etag.as_ref(),
                timeout_hint_secs,
                request_timeout: ctx
                    .cap(timeout_hint_secs.map(|s| Duration::from_secs(s) + REQUEST_TIMEOUT_SLACK)),
            };

            match self.transport.fetch(&req) {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_retryable() && !session.is_expired() => {
                    warn!(key = %key, error = %e, "error when retrieving metadata; retrying");
                    ctx.sleep(self.retry_delay)?;
                }
                Err(e) => {
                    // A request cut short by the caller's deadline reports the
                    // deadline, not the transport symptom.
                    if ctx.is_expired() {
                        return Err(WatchError::DeadlineExceeded);
                    }
                    return Err(WatchError::Transport(e));
                }
            }
        }
    }
}
