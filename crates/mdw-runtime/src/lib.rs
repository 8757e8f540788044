//! mdw-runtime
//!
//! Drives the long-poll client and the reconciler:
//! - [`WatchLoop`]: poll -> reconcile -> repeat, once or forever
//! - [`KeyBootstrap`]: one-time public key download before the first poll
//! - one-shot helpers ([`get_attribute`], [`await_update`], [`capture_value`])
//!
//! Blocking, single-threaded. Cancellation and deadlines flow through
//! [`mdw_longpoll::WaitContext`].

mod bootstrap;
mod error;
mod oneshot;
mod watch_loop;

pub use bootstrap::{key_fetch_command, CommandRunner, KeyBootstrap, ShellRunner};
pub use error::RunError;
pub use oneshot::{await_update, capture_value, get_attribute};
pub use watch_loop::{RunMode, RunSummary, WatchLoop, WatchLoopConfig};
