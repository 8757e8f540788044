//! mdw-longpoll
//!
//! Long-poll client for a single metadata attribute.
//!
//! - [`MetadataTransport`] sends one request (`HttpTransport` in production).
//! - [`MetadataWatcher::wait`] owns retry classification, etag comparison and
//!   the per-wait timeout.
//! - [`WaitContext`] carries the caller's hard deadline and cancellation token
//!   into every blocking step.
//!
//! Strictly blocking and single-threaded. No state-file logic lives here.

mod context;
mod error;
mod transport;
mod types;
mod watcher;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use context::{CancelToken, WaitContext};
pub use error::{TransportError, WatchError, RETRYABLE_STATUS_CODES};
pub use transport::{
    AttributeRequest, AttributeResponse, HttpTransport, MetadataTransport, METADATA_FLAVOR,
    METADATA_FLAVOR_HEADER, REQUEST_TIMEOUT_SLACK, UNKNOWN_ETAG,
};
pub use types::{ETag, MetadataKey, WaitOutcome, WatchSession};
pub use watcher::MetadataWatcher;
