use std::fmt;

/// Status codes that mean "the service is not ready yet, ask again".
pub const RETRYABLE_STATUS_CODES: [u16; 3] = [
    503, // service unavailable
    404, // attribute not (yet) defined
    408, // request timeout
];

/// Failure of a single metadata request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The service answered with anything other than `200 OK`.
    Status { code: u16, reason: String },
    /// The client-side request timeout fired before a response arrived.
    Timeout(String),
    /// Connection, TLS, or body-read failure.
    Network(String),
}

impl TransportError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Only the three "not ready" status codes are retried; everything else,
    /// including client-side timeouts, is fatal.
    pub fn is_retryable(&self) -> bool {
        self.status_code()
            .map(|c| RETRYABLE_STATUS_CODES.contains(&c))
            .unwrap_or(false)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Status { code, reason } => {
                write!(f, "metadata http error status={code}: {reason}")
            }
            TransportError::Timeout(msg) => write!(f, "metadata request timed out: {msg}"),
            TransportError::Network(msg) => write!(f, "metadata transport error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Why a [`crate::MetadataWatcher::wait`] call gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    /// Fatal transport failure, or a retryable one after the session deadline.
    Transport(TransportError),
    /// The caller's deadline passed (outer, process-level bound).
    DeadlineExceeded,
    /// The caller's cancellation token fired.
    Cancelled,
}

impl WatchError {
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            WatchError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchError::Transport(e) => write!(f, "{e}"),
            WatchError::DeadlineExceeded => write!(f, "timeout when retrieving metadata"),
            WatchError::Cancelled => write!(f, "metadata wait cancelled"),
        }
    }
}

impl std::error::Error for WatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WatchError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for WatchError {
    fn from(e: TransportError) -> Self {
        WatchError::Transport(e)
    }
}
