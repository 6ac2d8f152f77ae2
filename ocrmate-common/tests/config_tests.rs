//! Configuration resolution tests
//!
//! Uses serial_test to prevent ENV variable races: every test that touches
//! OCRMATE_* variables is marked #[serial].

use ocrmate_common::config::{
    load_toml_config, ConfigResolver, AUTO_APPROVE_ENV_VAR, CONFIG_ENV_VAR,
    HUMAN_REVIEW_ENV_VAR, POLICY_ENV_VAR,
};
use ocrmate_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(POLICY_ENV_VAR);
    env::remove_var(HUMAN_REVIEW_ENV_VAR);
    env::remove_var(AUTO_APPROVE_ENV_VAR);
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config_file() {
    let file = write_config(
        r#"
        [logging]
        level = "debug"

        [verification]
        conflict_policy = "weighted_average"
        tie_break = "ocr"
        human_review_threshold = 0.55
        auto_approve_threshold = 0.95
        extractor_timeout_ms = 5000
        "#,
    );

    let config = load_toml_config(file.path()).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.verification.conflict_policy.as_deref(), Some("weighted_average"));
    assert_eq!(config.verification.tie_break.as_deref(), Some("ocr"));
    assert_eq!(config.verification.human_review_threshold, Some(0.55));
    assert_eq!(config.verification.auto_approve_threshold, Some(0.95));
    assert_eq!(config.verification.extractor_timeout_ms, Some(5000));
}

#[test]
fn test_malformed_toml_is_config_error() {
    let file = write_config("[verification\nhuman_review_threshold = ");
    let result = load_toml_config(file.path());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_cli_path_has_highest_priority() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/ocrmate-env-config.toml");

    let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/ocrmate-cli-config.toml")));
    assert_eq!(
        resolver.resolve_path(),
        Some(PathBuf::from("/tmp/ocrmate-cli-config.toml"))
    );

    clear_env();
}

#[test]
#[serial]
fn test_env_path_used_without_cli_argument() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/ocrmate-env-config.toml");

    let resolver = ConfigResolver::new(None);
    assert_eq!(
        resolver.resolve_path(),
        Some(PathBuf::from("/tmp/ocrmate-env-config.toml"))
    );

    clear_env();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_error() {
    clear_env();
    let resolver = ConfigResolver::new(Some(PathBuf::from(
        "/nonexistent/ocrmate/definitely-missing.toml",
    )));
    assert!(matches!(resolver.load(), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_env();
    let file = write_config(
        r#"
        [verification]
        conflict_policy = "prefer_ocr"
        human_review_threshold = 0.5
        "#,
    );
    env::set_var(POLICY_ENV_VAR, "human_review");
    env::set_var(HUMAN_REVIEW_ENV_VAR, "0.7");

    let config = ConfigResolver::new(Some(file.path().to_path_buf()))
        .load()
        .unwrap();
    assert_eq!(config.verification.conflict_policy.as_deref(), Some("human_review"));
    assert_eq!(config.verification.human_review_threshold, Some(0.7));

    clear_env();
}

#[test]
#[serial]
fn test_non_numeric_env_threshold_is_rejected() {
    clear_env();
    let file = write_config("");
    env::set_var(AUTO_APPROVE_ENV_VAR, "high");

    let result = ConfigResolver::new(Some(file.path().to_path_buf())).load();
    assert!(matches!(result, Err(Error::Config(_))));

    clear_env();
}

#[test]
#[serial]
fn test_env_override_is_validated() {
    clear_env();
    let file = write_config(
        r#"
        [verification]
        auto_approve_threshold = 0.8
        "#,
    );
    env::set_var(HUMAN_REVIEW_ENV_VAR, "0.85");

    let result = ConfigResolver::new(Some(file.path().to_path_buf())).load();
    assert!(result.is_err(), "review threshold above approve threshold must fail");

    clear_env();
}
