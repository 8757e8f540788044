use anyhow::{Context, Result};
use mdw_config::timeout_or_default;
use mdw_longpoll::{CancelToken, ETag, WaitContext};
use std::path::Path;
use std::time::Duration;

use super::CommandContext;

/// `mdw get`: one wait, value on stdout.
pub fn get(
    ctx: &CommandContext,
    key: Option<String>,
    timeout: Option<i64>,
    etag: Option<String>,
) -> Result<()> {
    let key = ctx.key(key)?;
    let timeout = timeout
        .filter(|t| *t > 0)
        .map(|t| Duration::from_secs(t as u64));

    let mut watcher = ctx.watcher()?.with_etag(etag.map(ETag::new));
    let value = mdw_runtime::get_attribute(&mut watcher, &key, timeout, &WaitContext::unbounded())
        .with_context(|| format!("get \"{key}\" failed"))?;
    println!("{value}");
    Ok(())
}

/// `mdw await-update`: wait under a hard deadline, value on stdout.
pub fn await_update(ctx: &CommandContext, key: Option<String>, timeout: Option<i64>) -> Result<()> {
    let key = ctx.key(key)?;
    let timeout = timeout_or_default(timeout.or(ctx.file.watch.timeout_secs));

    let mut watcher = ctx.watcher()?;
    let value = mdw_runtime::await_update(&mut watcher, &key, timeout, &CancelToken::new())
        .with_context(|| format!("await update of \"{key}\" failed"))?;
    println!("{value}");
    Ok(())
}

/// `mdw capture`: like `await-update`, then write the value to a file.
pub fn capture(
    ctx: &CommandContext,
    key: Option<String>,
    output: Option<String>,
    timeout: Option<i64>,
) -> Result<()> {
    let key = ctx.key(key)?;
    let output = ctx.output_state_file(output)?;
    let timeout = timeout_or_default(timeout.or(ctx.file.watch.timeout_secs));

    let mut watcher = ctx.watcher()?;
    mdw_runtime::capture_value(
        &mut watcher,
        &key,
        timeout,
        Path::new(&output),
        &CancelToken::new(),
    )
    .with_context(|| format!("capture of \"{key}\" failed"))?;
    Ok(())
}
