//! mdw-config
//!
//! Defaults, bounds and the optional layered YAML config shared by the
//! metadata watcher tools.
//!
//! Precedence when resolving a setting: CLI flag > config file > environment
//! > built-in default. This crate owns the last three; the CLI applies flags.

mod env;
mod file;
mod limits;

pub use env::{load_dotenv, metadata_url_from_env, ENV_METADATA_URL};
pub use file::{BootstrapSection, MetadataSection, WatchSection, WatcherFileConfig};
pub use limits::*;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

/// JSON-pointer prefixes that the watcher tools actually read.
///
/// A leaf in a loaded config that is not under one of these is reported as
/// unknown. Keep this in sync with [`WatcherFileConfig`].
pub const KNOWN_POINTERS: &[&str] = &[
    "/metadata/url",
    "/metadata/scope",
    "/metadata/retry_delay_secs",
    "/watch/key",
    "/watch/output_state_file",
    "/watch/timeout_secs",
    "/watch/polling_interval_secs",
    "/bootstrap/fetch_keys",
    "/bootstrap/output_key_file",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct UnknownKeyReport {
    /// Leaf pointers not covered by [`KNOWN_POINTERS`] (sorted, unique).
    pub unknown_leaf_pointers: Vec<String>,
}

impl UnknownKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unknown_leaf_pointers.is_empty()
    }
}

/// Produce an unknown-key report for a merged config document.
/// If `policy == Fail`, returns an error when unknown keys exist.
pub fn report_unknown_keys(config_json: &Value, policy: UnknownKeyPolicy) -> Result<UnknownKeyReport> {
    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unknown: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !KNOWN_POINTERS.iter().any(|kp| is_prefix_pointer(kp, lp)))
        // An empty document has a single "/" leaf (null); that is not a key.
        .filter(|lp| lp != "/")
        .collect();
    unknown.sort();
    unknown.dedup();

    let report = UnknownKeyReport {
        unknown_leaf_pointers: unknown,
    };

    if policy == UnknownKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNKNOWN_KEYS: {} unknown config leaf key(s) detected. First few: {}",
            report.unknown_leaf_pointers.len(),
            preview_list(&report.unknown_leaf_pointers, 12)
        );
    }

    Ok(report)
}

/// Return true if `prefix` is a JSON-pointer prefix of `leaf`.
///
/// "/a/b" covers "/a/b" and "/a/b/c" but not "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    let take = items.iter().take(n).cloned().collect::<Vec<_>>();
    format!("{:?}", take)
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// An empty layer stack: every setting falls through to env/defaults.
    pub fn empty() -> Self {
        // Infallible: the empty object always serializes.
        load_layered_yaml_from_strings(&[]).unwrap_or_else(|_| LoadedConfig {
            config_hash: sha256_hex(b"{}"),
            canonical_json: "{}".to_string(),
            config_json: serde_json::json!({}),
        })
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    // Earlier docs are base, later docs override.
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        // A blank document parses as null; it contributes nothing.
        if v_json.is_null() {
            continue;
        }
        merged = deep_merge(merged, v_json);
    }

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

/// Serialize with object keys sorted so key order in the YAML does not
/// affect the hash.
fn canonicalize_json(v: &Value) -> Result<String> {
    fn sorted(v: &Value) -> Value {
        match v {
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut out = serde_json::Map::new();
                for k in keys {
                    out.insert(k.clone(), sorted(&map[k]));
                }
                Value::Object(out)
            }
            Value::Array(arr) => Value::Array(arr.iter().map(sorted).collect()),
            other => other.clone(),
        }
    }
    serde_json::to_string(&sorted(v)).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_pointer_respects_segment_boundary() {
        assert!(is_prefix_pointer("/watch/key", "/watch/key"));
        assert!(is_prefix_pointer("/watch", "/watch/key"));
        assert!(!is_prefix_pointer("/watch/key", "/watch/keys"));
    }

    #[test]
    fn empty_config_is_clean() {
        let cfg = LoadedConfig::empty();
        assert_eq!(cfg.canonical_json, "{}");
        let r = report_unknown_keys(&cfg.config_json, UnknownKeyPolicy::Fail).unwrap();
        assert!(r.is_clean());
    }

    #[test]
    fn blank_yaml_layer_is_ignored() {
        let a = load_layered_yaml_from_strings(&["watch:\n  key: k\n", ""]).unwrap();
        assert_eq!(a.config_json["watch"]["key"], "k");
    }
}
