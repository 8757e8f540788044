use anyhow::{Context, Result};
use mdw_config::{polling_interval_or_default, timeout_or_default};
use mdw_longpoll::CancelToken;
use mdw_reconcile::StateFile;
use mdw_runtime::{KeyBootstrap, RunMode, ShellRunner, WatchLoop, WatchLoopConfig};
use tracing::info;

use super::CommandContext;
use crate::IapWatchArgs;

pub fn run(ctx: &CommandContext, args: IapWatchArgs) -> Result<()> {
    let key = ctx.key(args.key)?;
    let state_file = StateFile::new(ctx.output_state_file(args.output_state_file)?);
    let watch = &ctx.file.watch;
    let boot = &ctx.file.bootstrap;

    let mut cfg = WatchLoopConfig::new(key, state_file);
    cfg.mode = if args.once {
        RunMode::Once
    } else {
        RunMode::Forever
    };
    cfg.timeout = timeout_or_default(args.timeout.or(watch.timeout_secs));
    cfg.polling_interval =
        polling_interval_or_default(args.polling_interval.or(watch.polling_interval_secs));

    if args.fetch_keys.or(boot.fetch_keys).unwrap_or(false) {
        let path = args
            .output_key_file
            .or_else(|| boot.output_key_file.clone())
            .context("--output_key_file is required with --fetch_keys")?;
        cfg.bootstrap = Some(KeyBootstrap::new(path));
    }

    let mut watch_loop = WatchLoop::new(cfg, ctx.watcher()?, ShellRunner);
    let summary = watch_loop
        .run(&CancelToken::new())
        .context("iap watch failed")?;

    info!(
        polls = summary.polls,
        reconciles = summary.reconciles,
        enabled = summary.last_report.map(|r| r.decision.enabled),
        "iap watch finished"
    );
    Ok(())
}
