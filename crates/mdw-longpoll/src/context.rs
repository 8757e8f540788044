//! Explicit per-call deadline and cancellation for blocking waits.
//!
//! A [`WaitContext`] is handed to every blocking call. Between requests the
//! watcher checks it, retry sleeps wake early when the token is cancelled,
//! and each HTTP request carries a timeout capped at the remaining deadline
//! so an in-flight long poll is torn down (connection closed) on expiry.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::WatchError;

/// Cloneable, thread-safe cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock().unwrap_or_else(|e| e.into_inner());
        *cancelled = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Block for up to `dur`. Returns `true` if cancelled (before or during).
    pub fn wait_timeout(&self, dur: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (guard, _) = cvar
            .wait_timeout_while(guard, dur, |cancelled| !*cancelled)
            .unwrap_or_else(|e| e.into_inner());
        *guard
    }
}

/// Deadline + cancellation token for one blocking call chain.
#[derive(Debug, Clone, Default)]
pub struct WaitContext {
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl WaitContext {
    /// No deadline, fresh token.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }

    /// Cancellation wins over deadline expiry when both hold.
    pub fn check(&self) -> Result<(), WatchError> {
        if self.cancel.is_cancelled() {
            return Err(WatchError::Cancelled);
        }
        if self.is_expired() {
            return Err(WatchError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Sleep for `dur`, cut short by cancellation or the deadline.
    pub fn sleep(&self, dur: Duration) -> Result<(), WatchError> {
        let capped = match self.remaining() {
            Some(r) => dur.min(r),
            None => dur,
        };
        if self.cancel.wait_timeout(capped) {
            return Err(WatchError::Cancelled);
        }
        self.check()
    }

    /// Cap a per-request timeout at the remaining deadline.
    pub fn cap(&self, timeout: Option<Duration>) -> Option<Duration> {
        match (timeout, self.remaining()) {
            (Some(t), Some(r)) => Some(t.min(r)),
            (None, r) => r,
            (t, None) => t,
        }
    }
}
