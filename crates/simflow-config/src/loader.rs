//! Configuration Loader
//!
//! Merges defaults, the override file, environment variables and CLI flags,
//! then resolves and checks the unit under test.

use crate::layout::{Layout, DEFAULT_BUILD_DIR, DEFAULT_SOURCE_DIR};
use crate::project::ProjectConfig;
use crate::unit::UnitUnderTest;
use crate::{ConfigError, ConfigResult, OVERRIDE_FILE};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable selecting the unit under test
pub const ENV_UNIT: &str = "SIMFLOW_UNIT";

/// Environment variable overriding the build-output directory
pub const ENV_BUILD_DIR: &str = "SIMFLOW_BUILD_DIR";

/// Configuration loader
///
/// Precedence, lowest to highest:
/// 1. Built-in defaults
/// 2. `simflow.toml` in the project directory
/// 3. Environment variables (SIMFLOW_*)
/// 4. CLI flags set through the `with_*` methods
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Project root directory
    root: PathBuf,
    /// Unit from the command line
    cli_unit: Option<String>,
    /// Build directory from the command line
    cli_build_dir: Option<PathBuf>,
}

/// External tool programs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Hardware compiler
    pub compiler: String,
    /// Simulation runtime
    pub simulator: String,
    /// Waveform viewer
    pub viewer: String,
    /// Extra compiler arguments
    pub compiler_flags: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            compiler: "iverilog".to_string(),
            simulator: "vvp".to_string(),
            viewer: "gtkwave".to_string(),
            compiler_flags: Vec::new(),
        }
    }
}

/// Fully resolved configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct Config {
    /// Project directories
    pub layout: Layout,
    /// Unit under test, checked to have an existing source file
    pub unit: UnitUnderTest,
    /// External tools
    pub tools: ToolConfig,
}

impl ConfigLoader {
    /// Create a loader for the project rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cli_unit: None,
            cli_build_dir: None,
        }
    }

    /// Unit override from the command line
    pub fn with_unit(mut self, unit: Option<String>) -> Self {
        self.cli_unit = unit;
        self
    }

    /// Build directory override from the command line
    pub fn with_build_dir(mut self, build_dir: Option<PathBuf>) -> Self {
        self.cli_build_dir = build_dir;
        self
    }

    /// Path of the override file for this project
    pub fn override_file(&self) -> PathBuf {
        self.root.join(OVERRIDE_FILE)
    }

    /// Resolve the full configuration, failing fast when the unit is unset
    /// or its source file does not exist
    pub fn load(&self) -> ConfigResult<Config> {
        let project = self.load_project()?;
        let layout = self.layout_from(&project)?;
        let tools = tools_from(&project);

        let raw_unit = self
            .cli_unit
            .clone()
            .or_else(|| env_value(ENV_UNIT))
            .or(project.unit)
            .ok_or_else(|| ConfigError::UnitNotSet {
                file: self.override_file(),
            })?;
        let unit = UnitUnderTest::parse(&raw_unit)?;

        let source = layout.source_path(&unit);
        if !source.is_file() {
            return Err(ConfigError::SourceNotFound {
                unit: unit.to_string(),
                path: source,
                file: self.override_file(),
            });
        }

        Ok(Config {
            layout,
            unit,
            tools,
        })
    }

    /// Resolve only the project layout; no unit is required
    pub fn load_layout(&self) -> ConfigResult<Layout> {
        let project = self.load_project()?;
        self.layout_from(&project)
    }

    fn load_project(&self) -> ConfigResult<ProjectConfig> {
        Ok(ProjectConfig::load_from_dir(&self.root)?.unwrap_or_default())
    }

    fn layout_from(&self, project: &ProjectConfig) -> ConfigResult<Layout> {
        let source_dir = project
            .source_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR));
        let build_dir = self
            .cli_build_dir
            .clone()
            .or_else(|| env_value(ENV_BUILD_DIR).map(PathBuf::from))
            .or_else(|| project.build_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR));

        Layout::new(&self.root, source_dir, build_dir)
    }

    /// Project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn tools_from(project: &ProjectConfig) -> ToolConfig {
    let defaults = ToolConfig::default();
    ToolConfig {
        compiler: project.compiler.clone().unwrap_or(defaults.compiler),
        simulator: project.simulator.clone().unwrap_or(defaults.simulator),
        viewer: project.viewer.clone().unwrap_or(defaults.viewer),
        compiler_flags: project.compiler_flags.clone(),
    }
}

/// Non-empty environment variable value
fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn project_with_source(unit: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src").join(format!("{}.v", unit));
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, "module top; endmodule\n").unwrap();
        temp_dir
    }

    #[test]
    #[serial]
    fn test_cli_unit() {
        env::remove_var(ENV_UNIT);
        let temp_dir = project_with_source("counter_tb");

        let config = ConfigLoader::new(temp_dir.path())
            .with_unit(Some("counter_tb".to_string()))
            .load()
            .unwrap();

        assert_eq!(config.unit.to_string(), "counter_tb");
        assert_eq!(config.tools, ToolConfig::default());
    }

    #[test]
    #[serial]
    fn test_unit_from_override_file() {
        env::remove_var(ENV_UNIT);
        let temp_dir = project_with_source("counter/counter_tb");
        fs::write(
            temp_dir.path().join(OVERRIDE_FILE),
            "unit = \"counter/counter_tb\"\n",
        )
        .unwrap();

        let config = ConfigLoader::new(temp_dir.path()).load().unwrap();
        assert_eq!(config.unit.to_string(), "counter/counter_tb");
    }

    #[test]
    #[serial]
    fn test_unit_not_set() {
        env::remove_var(ENV_UNIT);
        let temp_dir = TempDir::new().unwrap();

        let err = ConfigLoader::new(temp_dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::UnitNotSet { .. }));
        let message = err.to_string();
        assert!(message.contains("--unit"));
        assert!(message.contains(OVERRIDE_FILE));
    }

    #[test]
    #[serial]
    fn test_env_unit_beats_file() {
        let temp_dir = project_with_source("from_env");
        fs::write(temp_dir.path().join(OVERRIDE_FILE), "unit = \"from_file\"\n").unwrap();

        env::set_var(ENV_UNIT, "from_env");
        let result = ConfigLoader::new(temp_dir.path()).load();
        env::remove_var(ENV_UNIT);

        assert_eq!(result.unwrap().unit.to_string(), "from_env");
    }

    #[test]
    #[serial]
    fn test_build_dir_precedence() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(OVERRIDE_FILE), "build_dir = \"file_out\"\n").unwrap();

        env::remove_var(ENV_BUILD_DIR);
        let layout = ConfigLoader::new(temp_dir.path()).load_layout().unwrap();
        assert_eq!(layout.build_dir(), temp_dir.path().join("file_out"));

        env::set_var(ENV_BUILD_DIR, "env_out");
        let from_env = ConfigLoader::new(temp_dir.path()).load_layout();
        let from_cli = ConfigLoader::new(temp_dir.path())
            .with_build_dir(Some(PathBuf::from("cli_out")))
            .load_layout();
        env::remove_var(ENV_BUILD_DIR);

        assert_eq!(from_env.unwrap().build_dir(), temp_dir.path().join("env_out"));
        assert_eq!(from_cli.unwrap().build_dir(), temp_dir.path().join("cli_out"));
    }

    #[test]
    fn test_tools_from_file() {
        let project = ProjectConfig {
            compiler: Some("iverilog-12".to_string()),
            compiler_flags: vec!["-g2012".to_string()],
            ..Default::default()
        };
        let tools = tools_from(&project);
        assert_eq!(tools.compiler, "iverilog-12");
        assert_eq!(tools.simulator, "vvp");
        assert_eq!(tools.compiler_flags, vec!["-g2012"]);
    }
}
