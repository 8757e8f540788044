//! Single-value helpers behind the `get`, `await-update` and `capture` commands.

use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

use mdw_longpoll::{CancelToken, MetadataKey, MetadataTransport, MetadataWatcher, WaitContext};
use tracing::info;

use crate::RunError;

/// One wait for a change of `key`. An empty result is a failure.
///
/// `timeout` of `None` waits indefinitely (until `ctx` stops it).
pub fn get_attribute<T: MetadataTransport>(
    watcher: &mut MetadataWatcher<T>,
    key: &MetadataKey,
    timeout: Option<Duration>,
    ctx: &WaitContext,
) -> Result<String, RunError> {
    let out = watcher.wait(key, timeout, ctx)?;
    if !out.has_value() {
        return Err(RunError::EmptyValue {
            key: key.to_string(),
        });
    }
    Ok(out.value)
}

/// Wait, under a hard deadline of `timeout`, until `key` holds a non-empty value.
pub fn await_update<T: MetadataTransport>(
    watcher: &mut MetadataWatcher<T>,
    key: &MetadataKey,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<String, RunError> {
    let ctx = WaitContext::with_timeout(timeout).with_cancel(cancel.clone());
    loop {
        let out = watcher.wait(key, ctx.remaining(), &ctx)?;
        if out.has_value() {
            return Ok(out.value);
        }
        info!(key = %key, "no value before timeout; waiting again");
        ctx.check()?;
    }
}

/// [`await_update`], then write the value verbatim to `output`.
pub fn capture_value<T: MetadataTransport>(
    watcher: &mut MetadataWatcher<T>,
    key: &MetadataKey,
    timeout: Duration,
    output: &Path,
    cancel: &CancelToken,
) -> Result<String, RunError> {
    let value = await_update(watcher, key, timeout, cancel)?;
    fs::write(output, &value)
        .with_context(|| format!("write output file failed: {}", output.display()))
        .map_err(RunError::Io)?;
    info!(key = %key, path = %output.display(), "value captured");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdw_longpoll::testkit::ScriptedTransport;
    use mdw_longpoll::WatchError;

    fn key() -> MetadataKey {
        MetadataKey::new("AEF_IAP_state").unwrap()
    }

    #[test]
    fn get_returns_first_non_empty_change() {
        let t = ScriptedTransport::new()
            .respond(Some("1"), "")
            .respond(Some("2"), "v2");
        let mut w = MetadataWatcher::new(&t);

        let v = get_attribute(&mut w, &key(), None, &WaitContext::unbounded()).unwrap();
        assert_eq!(v, "v2");
        assert_eq!(w.etag().map(|e| e.as_str()), Some("2"));
    }

    #[test]
    fn get_with_seeded_etag_skips_known_value() {
        let t = ScriptedTransport::new()
            .respond(Some("7"), "old")
            .respond(Some("8"), "new");
        let mut w = MetadataWatcher::new(&t).with_etag(Some(mdw_longpoll::ETag::new("7")));

        let v = get_attribute(&mut w, &key(), None, &WaitContext::unbounded()).unwrap();
        assert_eq!(v, "new");
        assert_eq!(t.requests()[0].last_etag.as_deref(), Some("7"));
    }

    #[test]
    fn get_empty_at_timeout_is_an_error() {
        let t = ScriptedTransport::new()
            .with_delay(Duration::from_millis(30))
            .respond_forever(Some("1"), "");
        let mut w = MetadataWatcher::new(&t);

        let err = get_attribute(
            &mut w,
            &key(),
            Some(Duration::from_millis(100)),
            &WaitContext::unbounded(),
        )
        .unwrap_err();
        assert!(matches!(err, RunError::EmptyValue { .. }));
    }

    #[test]
    fn await_update_hits_outer_deadline() {
        let t = ScriptedTransport::new()
            .with_delay(Duration::from_millis(30))
            .respond_forever(Some("1"), "");
        let mut w = MetadataWatcher::new(&t);

        let err = await_update(&mut w, &key(), Duration::from_millis(150), &CancelToken::new())
            .unwrap_err();
        assert_eq!(err.watch(), Some(&WatchError::DeadlineExceeded));
    }

    #[test]
    fn capture_writes_value_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("captured");
        let t = ScriptedTransport::new().respond(Some("3"), "{\"enabled\": true}\n");
        let mut w = MetadataWatcher::new(&t);

        let v = capture_value(&mut w, &key(), Duration::from_secs(5), &out, &CancelToken::new())
            .unwrap();
        assert_eq!(v, "{\"enabled\": true}\n");
        assert_eq!(fs::read_to_string(&out).unwrap(), v);
    }
}
