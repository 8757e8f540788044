//! Command handler modules for mdw.
//!
//! Settings shared by every command (config layering, metadata endpoint,
//! watcher construction) live here. Command-specific logic lives in the
//! submodules.

pub mod iap_watch;
pub mod oneshot;

use anyhow::{Context, Result};
use clap::Args;
use mdw_config::{
    load_layered_yaml, metadata_url_from_env, report_unknown_keys, LoadedConfig, MetadataScope,
    UnknownKeyPolicy, WatcherFileConfig, DEFAULT_METADATA_URL, DEFAULT_RETRY_DELAY_SECS,
};
use mdw_longpoll::{HttpTransport, MetadataKey, MetadataWatcher};
use std::time::Duration;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Global flags
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Layered YAML config paths in merge order (repeatable)
    #[arg(long = "config", global = true)]
    pub config_paths: Vec<String>,

    /// Fail instead of warning on unrecognised config keys
    #[arg(long, global = true, default_value_t = false)]
    pub strict_config: bool,

    /// Metadata base URL (overrides config file and MDW_METADATA_URL)
    #[arg(long, global = true)]
    pub metadata_url: Option<String>,

    /// Attribute directory: instance | project
    #[arg(long, global = true)]
    pub scope: Option<String>,

    /// Seconds between retries of 503/404/408 responses
    #[arg(long, global = true)]
    pub retry_delay: Option<u64>,
}

// ---------------------------------------------------------------------------
// Resolved settings
// ---------------------------------------------------------------------------

/// Everything a command needs beyond its own flags.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub file: WatcherFileConfig,
    pub config_hash: String,
    pub metadata_url: String,
    pub scope: MetadataScope,
    pub retry_delay: Duration,
}

impl CommandContext {
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let loaded = if global.config_paths.is_empty() {
            LoadedConfig::empty()
        } else {
            let refs: Vec<&str> = global.config_paths.iter().map(|s| s.as_str()).collect();
            load_layered_yaml(&refs)?
        };

        let policy = if global.strict_config {
            UnknownKeyPolicy::Fail
        } else {
            UnknownKeyPolicy::Warn
        };
        let report = report_unknown_keys(&loaded.config_json, policy)?;
        if !report.is_clean() {
            warn!(keys = ?report.unknown_leaf_pointers, "ignoring unknown config keys");
        }

        let file = WatcherFileConfig::from_json(&loaded.config_json)?;
        if !global.config_paths.is_empty() {
            info!(config_hash = %loaded.config_hash, "config loaded");
        }

        let scope = match global.scope.as_deref() {
            Some(s) => MetadataScope::parse(s)?,
            None => file.scope()?.unwrap_or_default(),
        };

        let metadata_url = global
            .metadata_url
            .clone()
            .or_else(|| file.metadata.url.clone())
            .or_else(metadata_url_from_env)
            .unwrap_or_else(|| DEFAULT_METADATA_URL.to_string());

        let retry_delay = Duration::from_secs(
            global
                .retry_delay
                .or(file.metadata.retry_delay_secs)
                .unwrap_or(DEFAULT_RETRY_DELAY_SECS),
        );

        Ok(Self {
            file,
            config_hash: loaded.config_hash,
            metadata_url,
            scope,
            retry_delay,
        })
    }

    pub fn watcher(&self) -> Result<MetadataWatcher<HttpTransport>> {
        let transport = HttpTransport::new(self.metadata_url.clone(), self.scope)?;
        Ok(MetadataWatcher::new(transport).with_retry_delay(self.retry_delay))
    }

    /// `--key` flag, else `watch.key` from the config file.
    pub fn key(&self, flag: Option<String>) -> Result<MetadataKey> {
        let raw = flag
            .or_else(|| self.file.watch.key.clone())
            .context("--key is required (or watch.key in --config)")?;
        MetadataKey::new(raw)
    }

    /// `--output_state_file` flag, else `watch.output_state_file`.
    pub fn output_state_file(&self, flag: Option<String>) -> Result<String> {
        flag.or_else(|| self.file.watch.output_state_file.clone())
            .context("--output_state_file is required (or watch.output_state_file in --config)")
    }
}
