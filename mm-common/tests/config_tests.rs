//! Configuration file lookup and graceful degradation
//!
//! Uses serial_test because tests mutate MM_CONFIG.

use std::env;
use std::io::Write;

use mm_common::config::{TomlConfig, CONFIG_ENV_VAR};
use serial_test::serial;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_explicit_path_wins_over_env() {
    let explicit = write_config("port = 7001\n");
    let from_env = write_config("port = 7002\n");
    env::set_var(CONFIG_ENV_VAR, from_env.path());

    let config = TomlConfig::load(Some(explicit.path())).unwrap();
    assert_eq!(config.port, 7001);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_path_used_without_explicit() {
    let from_env = write_config("host = \"0.0.0.0\"\ntool_timeout_secs = 5\n");
    env::set_var(CONFIG_ENV_VAR, from_env.path());

    let config = TomlConfig::load(None).unwrap();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.tool_timeout_secs, 5);
    assert_eq!(config.port, 5001);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    assert!(TomlConfig::load(Some(&missing)).is_err());
}

#[test]
#[serial]
fn test_invalid_file_is_error() {
    let bad = write_config("max_upload_bytes = 0\n");
    assert!(TomlConfig::load(Some(bad.path())).is_err());
}

#[test]
fn test_full_file() {
    let config = TomlConfig::from_toml_str(
        r#"
host = "0.0.0.0"
port = 9000
ffprobe_path = "/opt/ffmpeg/bin/ffprobe"
avb_dump_path = "/opt/avb/avb-dump"
tool_timeout_secs = 30
max_upload_bytes = 1048576
normalize_max_depth = 64

[logging]
level = "mm_api=debug"
"#,
    )
    .unwrap();

    assert_eq!(config.port, 9000);
    assert_eq!(
        config.ffprobe_path.as_deref(),
        Some(std::path::Path::new("/opt/ffmpeg/bin/ffprobe"))
    );
    assert_eq!(config.max_upload_bytes, 1_048_576);
    assert_eq!(config.normalize_max_depth, 64);
    assert_eq!(config.logging.level, "mm_api=debug");
}
