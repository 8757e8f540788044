use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::MetadataScope;

/// Typed view over a merged config document. Every field is optional; a
/// missing field falls through to the environment or built-in default.
///
/// ```yaml
/// metadata:
///   url: http://metadata.google.internal/computeMetadata/v1
///   scope: instance
///   retry_delay_secs: 3
/// watch:
///   key: AEF_IAP_state
///   output_state_file: /var/run/iap/enabled
///   timeout_secs: 600
///   polling_interval_secs: 10
/// bootstrap:
///   fetch_keys: true
///   output_key_file: /var/run/iap/keys.jwk
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WatcherFileConfig {
    pub metadata: MetadataSection,
    pub watch: WatchSection,
    pub bootstrap: BootstrapSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MetadataSection {
    pub url: Option<String>,
    pub scope: Option<String>,
    pub retry_delay_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    pub key: Option<String>,
    pub output_state_file: Option<String>,
    pub timeout_secs: Option<i64>,
    pub polling_interval_secs: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BootstrapSection {
    pub fetch_keys: Option<bool>,
    pub output_key_file: Option<String>,
}

impl WatcherFileConfig {
    pub fn from_json(v: &Value) -> Result<Self> {
        WatcherFileConfig::deserialize(v).context("config does not match the watcher schema")
    }

    /// Parsed `metadata.scope`, if set.
    pub fn scope(&self) -> Result<Option<MetadataScope>> {
        self.metadata
            .scope
            .as_deref()
            .map(MetadataScope::parse)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_layered_yaml_from_strings;

    #[test]
    fn full_document_deserializes() {
        let cfg = load_layered_yaml_from_strings(&[r#"
metadata:
  url: "http://127.0.0.1:9000/computeMetadata/v1"
  scope: project
  retry_delay_secs: 1
watch:
  key: AEF_IAP_state
  output_state_file: /tmp/iap_state
  timeout_secs: 30
  polling_interval_secs: 5
bootstrap:
  fetch_keys: true
  output_key_file: /tmp/keys
"#])
        .unwrap();

        let f = WatcherFileConfig::from_json(&cfg.config_json).unwrap();
        assert_eq!(f.watch.key.as_deref(), Some("AEF_IAP_state"));
        assert_eq!(f.watch.timeout_secs, Some(30));
        assert_eq!(f.metadata.retry_delay_secs, Some(1));
        assert_eq!(f.bootstrap.fetch_keys, Some(true));
        assert_eq!(f.scope().unwrap(), Some(MetadataScope::Project));
    }

    #[test]
    fn empty_document_is_all_none() {
        let f = WatcherFileConfig::from_json(&serde_json::json!({})).unwrap();
        assert_eq!(f, WatcherFileConfig::default());
        assert_eq!(f.scope().unwrap(), None);
    }

    #[test]
    fn wrong_type_is_rejected() {
        let v = serde_json::json!({"watch": {"timeout_secs": "soon"}});
        assert!(WatcherFileConfig::from_json(&v).is_err());
    }
}
