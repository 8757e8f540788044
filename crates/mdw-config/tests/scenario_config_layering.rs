//! Layered watcher config: merge order, hash stability, typed view.

use mdw_config::{load_layered_yaml, load_layered_yaml_from_strings, WatcherFileConfig};

const BASE_YAML: &str = r#"
metadata:
  scope: instance
  retry_delay_secs: 3
watch:
  key: AEF_IAP_state
  output_state_file: /var/run/iap/enabled
  timeout_secs: 600
"#;

const BASE_YAML_REORDERED: &str = r#"
watch:
  timeout_secs: 600
  output_state_file: /var/run/iap/enabled
  key: AEF_IAP_state
metadata:
  retry_delay_secs: 3
  scope: instance
"#;

const OVERLAY_YAML: &str = r#"
watch:
  polling_interval_secs: 30
  timeout_secs: 60
"#;

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();

    assert_eq!(original.config_hash, reordered.config_hash);
    assert_eq!(original.canonical_json, reordered.canonical_json);
    assert_eq!(original.config_hash.len(), 64);
}

#[test]
fn later_layer_overrides_earlier_layer() {
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    let f = WatcherFileConfig::from_json(&merged.config_json).unwrap();

    // Overridden by the overlay.
    assert_eq!(f.watch.timeout_secs, Some(60));
    assert_eq!(f.watch.polling_interval_secs, Some(30));
    // Untouched base values survive the merge.
    assert_eq!(f.watch.key.as_deref(), Some("AEF_IAP_state"));
    assert_eq!(f.metadata.retry_delay_secs, Some(3));

    let base_only = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_ne!(merged.config_hash, base_only.config_hash);
}

#[test]
fn load_from_files_matches_load_from_strings() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("base.yaml");
    let overlay = dir.path().join("overlay.yaml");
    std::fs::write(&base, BASE_YAML)?;
    std::fs::write(&overlay, OVERLAY_YAML)?;

    let from_files = load_layered_yaml(&[
        base.to_str().unwrap(),
        overlay.to_str().unwrap(),
    ])?;
    let from_strings = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML])?;

    assert_eq!(from_files.config_hash, from_strings.config_hash);
    Ok(())
}

#[test]
fn missing_file_is_an_error() {
    let err = load_layered_yaml(&["/definitely/not/here.yaml"]).unwrap_err();
    assert!(format!("{err:#}").contains("failed to read yaml path"));
}

#[test]
fn invalid_yaml_is_an_error() {
    assert!(load_layered_yaml_from_strings(&["watch: [unclosed"]).is_err());
}
