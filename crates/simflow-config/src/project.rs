//! Override file (simflow.toml)
//!
//! A flat key-value file in the project directory. Every key is optional;
//! the common case is a single line selecting the unit under test:
//!
//! ```toml
//! unit = "counter/counter_tb"
//! ```

use crate::{ConfigError, ConfigResult, OVERRIDE_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of `simflow.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Unit under test, relative to the source directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Source directory (default: "src")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,

    /// Build-output directory (default: "build")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,

    /// Hardware compiler program (default: "iverilog")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,

    /// Simulator program (default: "vvp")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulator: Option<String>,

    /// Waveform viewer program (default: "gtkwave")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<String>,

    /// Extra arguments passed to the compiler before the source file
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub compiler_flags: Vec<String>,
}

impl ProjectConfig {
    /// Load the override file from a file path
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load `simflow.toml` from a directory, if present
    pub fn load_from_dir(dir: &Path) -> ConfigResult<Option<Self>> {
        let path = dir.join(OVERRIDE_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Self::load_from_file(&path).map(Some)
    }

    /// Validate field values
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("compiler", &self.compiler),
            ("simulator", &self.simulator),
            ("viewer", &self.viewer),
        ] {
            if let Some(program) = value {
                if program.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: field.to_string(),
                        reason: "program name cannot be empty".to_string(),
                    });
                }
            }
        }

        for (field, value) in [("source_dir", &self.source_dir), ("build_dir", &self.build_dir)] {
            if let Some(dir) = value {
                if dir.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: field.to_string(),
                        reason: "directory cannot be empty".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
