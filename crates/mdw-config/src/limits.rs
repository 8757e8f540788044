//! Built-in defaults and bounds for the watcher tools.
//!
//! Every tool reads its fallbacks from here so the CLI, the config file and
//! the runtime cannot drift apart.

use anyhow::{bail, Result};
use std::time::Duration;
use tracing::warn;

/// Outer process deadline used when `--timeout` is not given.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Polling cadence of the self-looping watcher.
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 10;

/// Inclusive lower bound for `--polling_interval`.
pub const MIN_POLLING_INTERVAL_SECS: i64 = 1;

/// Inclusive upper bound for `--polling_interval`.
///
/// The consuming web-server module fails open once the state file is older
/// than two minutes, so every poll has to land strictly inside that window.
pub const MAX_POLLING_INTERVAL_SECS: i64 = 119;

/// Delay between retries of a retryable metadata request.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 3;

/// Base URL of the metadata service (without scope).
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal/computeMetadata/v1";

/// Public key set fetched by the optional bootstrap step.
pub const IAP_PUBLIC_KEY_URL: &str = "https://www.gstatic.com/iap/verify/public_key-jwk";

/// Clamp a configured polling interval to `[MIN, MAX]`.
///
/// Out-of-range values are replaced by [`DEFAULT_POLLING_INTERVAL_SECS`]
/// rather than saturated to the nearest bound.
pub fn clamp_polling_interval(secs: i64) -> u64 {
    if (MIN_POLLING_INTERVAL_SECS..=MAX_POLLING_INTERVAL_SECS).contains(&secs) {
        secs as u64
    } else {
        DEFAULT_POLLING_INTERVAL_SECS
    }
}

/// Resolve the polling interval, logging when a configured value is rejected.
pub fn polling_interval_or_default(configured: Option<i64>) -> Duration {
    let secs = match configured {
        None => DEFAULT_POLLING_INTERVAL_SECS,
        Some(v) => {
            let clamped = clamp_polling_interval(v);
            if clamped as i64 != v {
                warn!(
                    configured = v,
                    default = DEFAULT_POLLING_INTERVAL_SECS,
                    "polling interval outside [{}, {}]s; using default",
                    MIN_POLLING_INTERVAL_SECS,
                    MAX_POLLING_INTERVAL_SECS
                );
            }
            clamped
        }
    };
    Duration::from_secs(secs)
}

/// Resolve the outer timeout. Zero and negative values fall back to the default.
pub fn timeout_or_default(configured: Option<i64>) -> Duration {
    match configured {
        Some(v) if v > 0 => Duration::from_secs(v as u64),
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Which metadata directory the watched key lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataScope {
    #[default]
    Instance,
    Project,
}

impl MetadataScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataScope::Instance => "instance",
            MetadataScope::Project => "project",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instance" => Ok(MetadataScope::Instance),
            "project" => Ok(MetadataScope::Project),
            other => bail!(
                "invalid metadata scope '{}'. expected one of: instance | project",
                other
            ),
        }
    }
}
