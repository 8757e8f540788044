//! Transport boundary for metadata requests.
//!
//! [`MetadataTransport`] issues exactly one request and reports exactly one
//! response or failure. Retry, etag comparison and deadlines belong to
//! [`crate::MetadataWatcher`], never to a transport.

use anyhow::{Context, Result};
use mdw_config::MetadataScope;
use reqwest::StatusCode;
use std::time::Duration;

use crate::{ETag, MetadataKey, TransportError};

/// Header every metadata request must carry.
pub const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
pub const METADATA_FLAVOR: &str = "Google";

/// Sent as `last_etag` before any etag is known. Never matches a real etag,
/// so the service answers immediately with the current value.
pub const UNKNOWN_ETAG: &str = "0";

/// Extra time granted on top of the `timeout_sec` hint before the client
/// gives up on a held-open request.
pub const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AttributeRequest<'a> {
    pub key: &'a MetadataKey,
    pub last_etag: Option<&'a ETag>,
    /// Server-side hold time (`timeout_sec`); `None` lets the service decide.
    pub timeout_hint_secs: Option<u64>,
    /// Client-side bound for this single request; `None` blocks until the
    /// service answers.
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeResponse {
    /// `None` when the service omitted the `etag` header.
    pub etag: Option<ETag>,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// One metadata GET with long-poll parameters.
///
/// Object-safe so callers can hold a `Box<dyn MetadataTransport>`.
pub trait MetadataTransport: Send + Sync {
    fn fetch(&self, req: &AttributeRequest<'_>) -> Result<AttributeResponse, TransportError>;
}

impl<T: MetadataTransport + ?Sized> MetadataTransport for &T {
    fn fetch(&self, req: &AttributeRequest<'_>) -> Result<AttributeResponse, TransportError> {
        (**self).fetch(req)
    }
}

impl<T: MetadataTransport + ?Sized> MetadataTransport for Box<T> {
    fn fetch(&self, req: &AttributeRequest<'_>) -> Result<AttributeResponse, TransportError> {
        (**self).fetch(req)
    }
}

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

/// Blocking HTTP transport against the metadata service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    base_url: String,
    scope: MetadataScope,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, scope: MetadataScope) -> Result<Self> {
        // reqwest's blocking client defaults to a 30s total timeout, which
        // would cut long polls short; every request sets its own instead.
        // The metadata service is link-local and must never go through a proxy.
        let http = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .no_proxy()
            .build()
            .context("failed to build metadata http client")?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            scope,
        })
    }

    pub fn attribute_url(&self, key: &MetadataKey) -> String {
        format!(
            "{}/{}/attributes/{}",
            self.base_url.trim_end_matches('/'),
            self.scope.as_str(),
            key.as_str()
        )
    }

    fn query(req: &AttributeRequest<'_>) -> Vec<(&'static str, String)> {
        let mut q = vec![(
            "last_etag",
            req.last_etag
                .map(|e| e.as_str().to_string())
                .unwrap_or_else(|| UNKNOWN_ETAG.to_string()),
        )];
        if let Some(t) = req.timeout_hint_secs {
            q.push(("timeout_sec", t.to_string()));
        }
        q.push(("wait_for_change", "true".to_string()));
        q
    }
}

impl MetadataTransport for HttpTransport {
    fn fetch(&self, req: &AttributeRequest<'_>) -> Result<AttributeResponse, TransportError> {
        let mut rb = self
            .http
            .get(self.attribute_url(req.key))
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR)
            .query(&Self::query(req));
        if let Some(t) = req.request_timeout {
            rb = rb.timeout(t);
        }

        let resp = rb.send().map_err(map_reqwest_error)?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(TransportError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let etag = resp
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(ETag::new);
        let body = resp.text().map_err(map_reqwest_error)?;

        Ok(AttributeResponse { etag, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if let Some(status) = e.status() {
        TransportError::Status {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        }
    } else {
        TransportError::Network(e.to_string())
    }
}
