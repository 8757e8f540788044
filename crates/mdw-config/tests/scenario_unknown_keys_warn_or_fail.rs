use mdw_config::{load_layered_yaml_from_strings, report_unknown_keys, UnknownKeyPolicy};

/// Unknown keys are reported (sorted) under WARN, rejected under FAIL, and
/// known keys are never flagged.

#[test]
fn warn_mode_reports_unknown_keys_without_error() {
    let yaml = r#"
watch:
  key: AEF_IAP_state
  keyy: typo
extra:
  b: 2
  a: 1
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");

    let report = report_unknown_keys(&loaded.config_json, UnknownKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert_eq!(
        report.unknown_leaf_pointers,
        vec![
            "/extra/a".to_string(),
            "/extra/b".to_string(),
            "/watch/keyy".to_string()
        ]
    );
}

#[test]
fn fail_mode_errors_on_unknown_keys() {
    let yaml = r#"
bootstrap:
  fetch_key: true
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");

    let result = report_unknown_keys(&loaded.config_json, UnknownKeyPolicy::Fail);
    let msg = format!("{:?}", result.err().expect("fail policy must error"));
    assert!(msg.contains("CONFIG_UNKNOWN_KEYS"));
}

#[test]
fn known_keys_are_clean() {
    let yaml = r#"
metadata:
  url: "http://localhost:8080/computeMetadata/v1"
  scope: project
  retry_delay_secs: 1
watch:
  key: k
  output_state_file: /tmp/s
  timeout_secs: 5
  polling_interval_secs: 1
bootstrap:
  fetch_keys: false
  output_key_file: /tmp/k
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unknown_keys(&loaded.config_json, UnknownKeyPolicy::Fail)
        .expect("known keys must pass");
    assert!(report.is_clean());
}
