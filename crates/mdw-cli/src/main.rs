//! `mdw`: metadata watcher tools.
//!
//! Logs go to stderr; `get`, `await-update` and `capture` print the value on
//! stdout. Any error exits with status 1.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};

use commands::GlobalArgs;

#[derive(Parser)]
#[command(name = "mdw")]
#[command(about = "Watch GCE metadata attributes and mirror them locally", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror the IAP enforcement flag into a marker file
    IapWatch(IapWatchArgs),

    /// Wait for one change of an attribute and print it
    Get {
        #[arg(long)]
        key: Option<String>,

        /// Seconds to wait; omitted or non-positive waits indefinitely
        #[arg(long, allow_negative_numbers = true)]
        timeout: Option<i64>,

        /// Last seen etag; the current value under this etag is skipped
        #[arg(long)]
        etag: Option<String>,
    },

    /// Wait (hard deadline) until an attribute holds a value and print it
    AwaitUpdate {
        #[arg(long)]
        key: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        timeout: Option<i64>,
    },

    /// Like await-update, then write the value to a file
    Capture {
        #[arg(long)]
        key: Option<String>,

        #[arg(long = "output_state_file", alias = "output-state-file", alias = "output-file")]
        output_state_file: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        timeout: Option<i64>,
    },
}

#[derive(Args)]
pub(crate) struct IapWatchArgs {
    /// Metadata key to watch
    #[arg(long, alias = "iap_metadata_key", alias = "iap-metadata-key")]
    key: Option<String>,

    /// Marker file; exists while enforcement is enabled
    #[arg(long = "output_state_file", alias = "output-state-file")]
    output_state_file: Option<String>,

    /// Seconds: outer deadline with --once, per-wait bound otherwise
    #[arg(long, allow_negative_numbers = true)]
    timeout: Option<i64>,

    /// Seconds between polls, 1..=119 (out-of-range values use the default)
    #[arg(
        long = "polling_interval",
        alias = "polling-interval",
        allow_negative_numbers = true
    )]
    polling_interval: Option<i64>,

    /// Download the public keys before watching
    #[arg(
        long = "fetch_keys",
        alias = "fetch-keys",
        num_args = 0..=1,
        default_missing_value = "true",
        action = ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    fetch_keys: Option<bool>,

    #[arg(long = "output_key_file", alias = "output-key-file")]
    output_key_file: Option<String>,

    /// Reconcile the first value and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

fn main() -> Result<()> {
    mdw_config::load_dotenv();
    init_tracing();

    let cli = Cli::parse();
    let ctx = commands::CommandContext::load(&cli.global)?;

    match cli.cmd {
        Commands::IapWatch(args) => commands::iap_watch::run(&ctx, args),
        Commands::Get { key, timeout, etag } => commands::oneshot::get(&ctx, key, timeout, etag),
        Commands::AwaitUpdate { key, timeout } => commands::oneshot::await_update(&ctx, key, timeout),
        Commands::Capture {
            key,
            output_state_file,
            timeout,
        } => commands::oneshot::capture(&ctx, key, output_state_file, timeout),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
