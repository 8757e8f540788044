//! Scenario: once mode applies exactly one value and exits.
//!
//! A failing key download must not stop the watch; an empty-then-valid
//! attribute is applied on the first non-empty change.

use std::time::Duration;

use mdw_config::polling_interval_or_default;
use mdw_longpoll::testkit::ScriptedTransport;
use mdw_longpoll::{CancelToken, MetadataKey, MetadataWatcher};
use mdw_reconcile::{DecisionReason, StateFile};
use mdw_runtime::{CommandRunner, KeyBootstrap, RunMode, WatchLoop, WatchLoopConfig};

struct FailingRunner;

impl CommandRunner for FailingRunner {
    fn run(&self, _command: &str) -> anyhow::Result<()> {
        anyhow::bail!("curl: (6) Could not resolve host")
    }
}

#[test]
fn key_fetch_failure_does_not_block_reconciliation() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let state = dir.path().join("iap_state");

    let transport = ScriptedTransport::new()
        .respond(Some("12"), "")
        .respond(Some("13"), r#"{"enabled": true}"#);

    let mut cfg = WatchLoopConfig::new(MetadataKey::new("AEF_IAP_state")?, StateFile::new(&state));
    cfg.mode = RunMode::Once;
    cfg.timeout = Duration::from_secs(5);
    cfg.polling_interval = polling_interval_or_default(Some(500));
    cfg.bootstrap = Some(KeyBootstrap::new(dir.path().join("keys.jwk")));

    let summary = WatchLoop::new(cfg, MetadataWatcher::new(&transport), FailingRunner)
        .run(&CancelToken::new())?;

    assert_eq!(summary.keys_fetched, Some(false));
    assert_eq!(summary.polls, 1);
    assert!(state.exists());
    assert_eq!(transport.calls(), 2);
    Ok(())
}

#[test]
fn ambiguous_value_disables_in_once_mode() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let state = dir.path().join("iap_state");
    std::fs::write(&state, "")?;

    let transport = ScriptedTransport::new().respond(Some("1"), r#"{"asdf": true}"#);
    let mut cfg = WatchLoopConfig::new(MetadataKey::new("AEF_IAP_state")?, StateFile::new(&state));
    cfg.mode = RunMode::Once;

    struct Unused;
    impl CommandRunner for Unused {
        fn run(&self, _command: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    let summary = WatchLoop::new(cfg, MetadataWatcher::new(&transport), Unused)
        .run(&CancelToken::new())?;

    let report = summary.last_report.expect("one reconciliation");
    assert_eq!(report.decision.reason, DecisionReason::MissingField);
    assert!(!state.exists());
    Ok(())
}

#[test]
fn out_of_range_polling_interval_falls_back_to_default() {
    assert_eq!(polling_interval_or_default(Some(0)), Duration::from_secs(10));
    assert_eq!(polling_interval_or_default(Some(120)), Duration::from_secs(10));
    assert_eq!(polling_interval_or_default(Some(-5)), Duration::from_secs(10));
    assert_eq!(polling_interval_or_default(Some(119)), Duration::from_secs(119));
    assert_eq!(polling_interval_or_default(Some(1)), Duration::from_secs(1));
    assert_eq!(polling_interval_or_default(None), Duration::from_secs(10));
}
