//! Configuration loading and precedence tests

use serial_test::serial;
use simflow_config::loader::{ENV_BUILD_DIR, ENV_UNIT};
use simflow_config::{ConfigError, ConfigLoader, OVERRIDE_FILE};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn clear_env() {
    env::remove_var(ENV_UNIT);
    env::remove_var(ENV_BUILD_DIR);
}

// ============================================================================
// Unit resolution
// ============================================================================

#[test]
#[serial]
fn test_cli_unit_always_wins() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "src/from_cli.v", "module from_cli; endmodule");
    write_file(temp_dir.path(), OVERRIDE_FILE, "unit = \"from_file\"\n");

    env::set_var(ENV_UNIT, "from_env");
    let result = ConfigLoader::new(temp_dir.path())
        .with_unit(Some("from_cli".to_string()))
        .load();
    clear_env();

    assert_eq!(result.unwrap().unit.to_string(), "from_cli");
}

#[test]
#[serial]
fn test_missing_source_is_fatal() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), OVERRIDE_FILE, "unit = \"ghost\"\n");

    let err = ConfigLoader::new(temp_dir.path()).load().unwrap_err();
    match err {
        ConfigError::SourceNotFound { ref unit, ref path, .. } => {
            assert_eq!(unit, "ghost");
            assert_eq!(path, &temp_dir.path().join("src").join("ghost.v"));
        }
        other => panic!("expected SourceNotFound, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("--unit"));
    assert!(message.contains(OVERRIDE_FILE));
}

#[test]
#[serial]
fn test_source_directory_is_not_a_source() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src/top.v")).unwrap();

    let err = ConfigLoader::new(temp_dir.path())
        .with_unit(Some("top".to_string()))
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::SourceNotFound { .. }));
}

#[test]
#[serial]
fn test_custom_source_dir_and_tools() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "rtl/cpu/alu_tb.v", "module alu_tb; endmodule");
    write_file(
        temp_dir.path(),
        OVERRIDE_FILE,
        r#"
unit = "cpu/alu_tb"
source_dir = "rtl"
build_dir = "sim"
compiler = "/opt/iverilog/bin/iverilog"
compiler_flags = ["-g2012"]
"#,
    );

    let config = ConfigLoader::new(temp_dir.path()).load().unwrap();
    assert_eq!(config.layout.source_dir(), temp_dir.path().join("rtl"));
    assert_eq!(config.layout.build_dir(), temp_dir.path().join("sim"));
    assert_eq!(config.tools.compiler, "/opt/iverilog/bin/iverilog");
    assert_eq!(config.tools.simulator, "vvp");
    assert_eq!(config.tools.compiler_flags, vec!["-g2012"]);
    assert_eq!(
        config.layout.source_path(&config.unit),
        temp_dir.path().join("rtl/cpu/alu_tb.v")
    );
}

#[test]
#[serial]
fn test_invalid_unit_reported_before_source_lookup() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    let err = ConfigLoader::new(temp_dir.path())
        .with_unit(Some("../escape".to_string()))
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

// ============================================================================
// Override file errors
// ============================================================================

#[test]
#[serial]
fn test_malformed_override_file() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), OVERRIDE_FILE, "unit = \n");

    let err = ConfigLoader::new(temp_dir.path())
        .with_unit(Some("top".to_string()))
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::TomlParseError { .. }));
}

#[test]
#[serial]
fn test_layout_without_unit() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    let layout = ConfigLoader::new(temp_dir.path())
        .with_build_dir(Some(PathBuf::from("out")))
        .load_layout()
        .unwrap();
    assert_eq!(layout.build_dir(), temp_dir.path().join("out"));
    assert_eq!(layout.root(), temp_dir.path());
}

#[test]
#[serial]
fn test_build_dir_over_sources_rejected() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), OVERRIDE_FILE, "source_dir = \"build/src\"\n");

    let err = ConfigLoader::new(temp_dir.path()).load_layout().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidLayout(_)));
}

#[test]
#[serial]
fn test_build_dir_resolving_to_root_rejected() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("out")).unwrap();

    let err = ConfigLoader::new(temp_dir.path())
        .with_build_dir(Some(PathBuf::from("out/..")))
        .load_layout()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidLayout(_)));

    write_file(temp_dir.path(), OVERRIDE_FILE, "build_dir = \"..\"\n");
    let err = ConfigLoader::new(temp_dir.path()).load_layout().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidLayout(_)));
}
