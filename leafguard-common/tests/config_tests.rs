//! Tests for data folder resolution
//!
//! Uses serial_test: tests manipulate LEAFGUARD_DATA and must not race.

use leafguard_common::config::{database_path, default_model_dir, resolve_data_folder};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

const ENV_VAR: &str = "LEAFGUARD_DATA";

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ENV_VAR, "/tmp/from-env");

    let resolved = resolve_data_folder(Some("/tmp/from-cli"), ENV_VAR).unwrap();
    assert_eq!(resolved, PathBuf::from("/tmp/from-cli"));

    env::remove_var(ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_when_no_cli() {
    env::set_var(ENV_VAR, "/tmp/from-env");

    let resolved = resolve_data_folder(None, ENV_VAR).unwrap();
    assert_eq!(resolved, PathBuf::from("/tmp/from-env"));

    env::remove_var(ENV_VAR);
}

#[test]
#[serial]
fn test_default_when_nothing_set() {
    env::remove_var(ENV_VAR);

    let resolved = resolve_data_folder(None, ENV_VAR).unwrap();
    assert!(!resolved.as_os_str().is_empty());
}

#[test]
fn test_derived_paths() {
    let data = PathBuf::from("/var/lib/leafguard");
    assert_eq!(database_path(&data), PathBuf::from("/var/lib/leafguard/leafguard.db"));
    assert_eq!(default_model_dir(&data), PathBuf::from("/var/lib/leafguard/model"));
}
