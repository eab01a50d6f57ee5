//! Configuration resolution and graceful degradation
//!
//! Tests touching ABASE_ROOT_FOLDER / ABASE_CONFIG are #[serial] so they do
//! not race on process environment.

use abase_common::config::{
    CompiledDefaults, ConfigSource, RootFolderInitializer, RootFolderResolver, TomlConfig, CONFIG_FILE_ENV,
    ROOT_FOLDER_ENV,
};
use abase_common::Network;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();
    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.to_string_lossy().contains("audiobase"));
    assert_eq!(defaults.log_level, "info");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root = RootFolderResolver::new("test-module").resolve(&TomlConfig::default());
    assert_eq!(root, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_env_var_beats_config_file() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/abase-env-root");

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/abase-toml-root")),
        ..TomlConfig::default()
    };
    let root = RootFolderResolver::new("test-module").resolve(&config);
    assert_eq!(root, PathBuf::from("/tmp/abase-env-root"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/abase-env-root");

    let root = RootFolderResolver::new("test-module")
        .with_cli_arg(Some(PathBuf::from("/tmp/abase-cli-root")))
        .resolve(&TomlConfig::default());
    assert_eq!(root, PathBuf::from("/tmp/abase-cli-root"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_config_file_root_used_without_env() {
    env::remove_var(ROOT_FOLDER_ENV);

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/abase-toml-root")),
        ..TomlConfig::default()
    };
    let root = RootFolderResolver::new("test-module").resolve(&config);
    assert_eq!(root, PathBuf::from("/tmp/abase-toml-root"));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
root_folder = "/srv/audiobase"

[logging]
level = "debug"

[deploy]
network = "sepolia"
gas_limit = 3000000

[discovery]
nodes = ["http://127.0.0.1:9000"]
"#
    )
    .unwrap();

    let config = TomlConfig::load_from(file.path()).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/audiobase")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.deploy.network, Network::Sepolia);
    assert_eq!(config.deploy.gas_limit, 3_000_000);
    assert_eq!(config.discovery.nodes, vec!["http://127.0.0.1:9000".to_string()]);
    assert_eq!(config.discovery.app_name, "AudioBASE");
}

#[test]
fn test_malformed_file_is_an_error_for_load_from() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[deploy\nport = ").unwrap();
    assert!(TomlConfig::load_from(file.path()).is_err());
}

#[test]
#[serial]
fn test_load_degrades_to_defaults_on_bad_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "this is not toml = = =").unwrap();

    let (config, source) = TomlConfig::load(Some(file.path()));
    assert_eq!(config.deploy.port, 5730);
    assert!(matches!(
        source,
        ConfigSource::Rejected { ref path, .. } if path.as_path() == file.path()
    ));
}

#[test]
#[serial]
fn test_load_reads_env_config_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[api]\nport = 6001").unwrap();
    env::set_var(CONFIG_FILE_ENV, file.path());

    let (config, source) = TomlConfig::load(None);
    assert_eq!(config.api.port, 6001);
    assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));

    env::remove_var(CONFIG_FILE_ENV);
}

#[test]
#[serial]
fn test_load_missing_explicit_file_uses_defaults() {
    let (config, source) = TomlConfig::load(Some(std::path::Path::new("/nonexistent/abase.toml")));
    assert_eq!(config.api.port, 5731);
    match source {
        ConfigSource::Rejected { path, reason } => {
            assert_eq!(path, PathBuf::from("/nonexistent/abase.toml"));
            assert!(!reason.is_empty());
        }
        other => panic!("expected rejected source, got {:?}", other),
    }
}

#[test]
fn test_initializer_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("root");

    let init = RootFolderInitializer::new(root.clone());
    init.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(init.database_path(), root.join("audiobase.db"));
}
