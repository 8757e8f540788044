use anyhow::{bail, Result};
use std::fmt;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Metadata key
// ---------------------------------------------------------------------------

/// Name of the watched attribute (e.g. `"AEF_IAP_state"`).
///
/// The scope and `attributes/` directory are added by the transport, so the
/// key itself must be a bare, non-empty path fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataKey(String);

impl MetadataKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            bail!("metadata key must not be empty");
        }
        if trimmed.starts_with('/') || trimmed.ends_with('/') {
            bail!("metadata key '{}' must not start or end with '/'", trimmed);
        }
        if trimmed.contains(['?', '#', ' ']) {
            bail!("metadata key '{}' contains a reserved character", trimmed);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ETag
// ---------------------------------------------------------------------------

/// Opaque version token returned by the metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag(String);

impl ETag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// State of one bounded wait.
///
/// `etag` starts as the watcher's last-known token and advances with every
/// accepted response; the watcher takes it back when the wait ends.
#[derive(Debug, Clone)]
pub struct WatchSession {
    pub etag: Option<ETag>,
    started_at: Instant,
    timeout: Option<Duration>,
}

impl WatchSession {
    /// A zero timeout means "wait forever", same as `None`.
    pub fn start(etag: Option<ETag>, timeout: Option<Duration>) -> Self {
        Self {
            etag,
            started_at: Instant::now(),
            timeout: timeout.filter(|t| !t.is_zero()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_expired(&self) -> bool {
        match self.timeout {
            Some(t) => self.started_at.elapsed() >= t,
            None => false,
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.timeout
            .map(|t| t.saturating_sub(self.started_at.elapsed()))
    }

    /// `timeout_sec` hint for the service: remaining whole seconds, rounded up,
    /// never below one.
    pub fn timeout_hint_secs(&self) -> Option<u64> {
        self.remaining().map(|r| {
            let secs = r.as_secs() + u64::from(r.subsec_nanos() > 0);
            secs.max(1)
        })
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of [`crate::MetadataWatcher::wait`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOutcome {
    /// Detected value, or the most recently read value on timeout (may be empty).
    pub value: String,
    pub timed_out: bool,
}

impl WaitOutcome {
    pub fn changed(value: String) -> Self {
        Self {
            value,
            timed_out: false,
        }
    }

    pub fn timed_out(value: String) -> Self {
        Self {
            value,
            timed_out: true,
        }
    }

    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }
}
