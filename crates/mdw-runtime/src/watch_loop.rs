use std::time::Duration;

use mdw_config::{DEFAULT_POLLING_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS};
use mdw_longpoll::{
    CancelToken, MetadataKey, MetadataTransport, MetadataWatcher, WaitContext, WatchError,
};
use mdw_reconcile::{reconcile_state_file, ReconcileReport, StateFile};
use tracing::{error, info};

use crate::{CommandRunner, KeyBootstrap, RunError};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Reconcile the first value, then exit.
    Once,
    #[default]
    Forever,
}

/// Resolved loop settings; interval clamping happens before this point.
#[derive(Debug, Clone)]
pub struct WatchLoopConfig {
    pub key: MetadataKey,
    pub state_file: StateFile,
    pub mode: RunMode,
    /// Once: hard deadline for the whole run. Forever: bound on each wait.
    pub timeout: Duration,
    pub polling_interval: Duration,
    pub bootstrap: Option<KeyBootstrap>,
}

impl WatchLoopConfig {
    pub fn new(key: MetadataKey, state_file: StateFile) -> Self {
        Self {
            key,
            state_file,
            mode: RunMode::Forever,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            polling_interval: Duration::from_secs(DEFAULT_POLLING_INTERVAL_SECS),
            bootstrap: None,
        }
    }
}

/// What a run did before it returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub polls: u64,
    pub reconciles: u64,
    pub last_report: Option<ReconcileReport>,
    /// `None` when no bootstrap was configured.
    pub keys_fetched: Option<bool>,
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Poll the attribute, reconcile the state file, repeat.
///
/// Forever mode forgets the etag before each poll, so every iteration reads
/// the current value and re-applies it: an enabled marker file is touched
/// once per polling interval.
pub struct WatchLoop<T, R> {
    cfg: WatchLoopConfig,
    watcher: MetadataWatcher<T>,
    runner: R,
}

impl<T: MetadataTransport, R: CommandRunner> WatchLoop<T, R> {
    pub fn new(cfg: WatchLoopConfig, watcher: MetadataWatcher<T>, runner: R) -> Self {
        Self {
            cfg,
            watcher,
            runner,
        }
    }

    pub fn config(&self) -> &WatchLoopConfig {
        &self.cfg
    }

    pub fn watcher(&self) -> &MetadataWatcher<T> {
        &self.watcher
    }

    /// Returns `Ok` when Once mode reconciled a value or Forever mode was
    /// cancelled. Once mode fails on the outer deadline, fatal transport
    /// errors and state-file errors.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<RunSummary, RunError> {
        let ctx = match self.cfg.mode {
            RunMode::Once => WaitContext::with_timeout(self.cfg.timeout),
            RunMode::Forever => WaitContext::unbounded(),
        }
        .with_cancel(cancel.clone());

        let mut summary = RunSummary::default();
        if let Some(bootstrap) = &self.cfg.bootstrap {
            summary.keys_fetched = Some(bootstrap.fetch(&self.runner));
        }

        info!(
            key = %self.cfg.key,
            path = %self.cfg.state_file.path().display(),
            mode = ?self.cfg.mode,
            timeout_secs = self.cfg.timeout.as_secs(),
            polling_interval_secs = self.cfg.polling_interval.as_secs(),
            "watching metadata"
        );

        match self.cfg.mode {
            RunMode::Once => self.run_once(&ctx, summary),
            RunMode::Forever => self.run_forever(&ctx, summary),
        }
    }

    fn run_once(
        &mut self,
        ctx: &WaitContext,
        mut summary: RunSummary,
    ) -> Result<RunSummary, RunError> {
        loop {
            summary.polls += 1;
            let wait_timeout = ctx.remaining().or(Some(self.cfg.timeout));
            let out = self.watcher.wait(&self.cfg.key, wait_timeout, ctx)?;

            if out.has_value() {
                let report =
                    reconcile_state_file(&out.value, &self.cfg.state_file).map_err(RunError::Io)?;
                summary.reconciles += 1;
                summary.last_report = Some(report);
                return Ok(summary);
            }

            info!(key = %self.cfg.key, "no value before timeout; polling again");
            ctx.check()?;
        }
    }

    fn run_forever(
        &mut self,
        ctx: &WaitContext,
        mut summary: RunSummary,
    ) -> Result<RunSummary, RunError> {
        loop {
            if ctx.cancel_token().is_cancelled() {
                return Ok(summary);
            }

            summary.polls += 1;
            self.watcher.reset_etag();
            match self
                .watcher
                .wait(&self.cfg.key, Some(self.cfg.timeout), ctx)
            {
                Ok(out) if out.has_value() => {
                    match reconcile_state_file(&out.value, &self.cfg.state_file) {
                        Ok(report) => {
                            summary.reconciles += 1;
                            summary.last_report = Some(report);
                        }
                        Err(e) => error!(error = %format!("{e:#}"), "state file update failed"),
                    }
                }
                Ok(_) => {
                    // The wait already held for the full timeout.
                    info!(key = %self.cfg.key, "no value before timeout; polling again");
                    continue;
                }
                Err(WatchError::Cancelled) => return Ok(summary),
                Err(e) => error!(key = %self.cfg.key, error = %e, "metadata wait failed"),
            }

            if ctx.sleep(self.cfg.polling_interval).is_err() {
                return Ok(summary);
            }
        }
    }
}
