//! simflow configuration system
//!
//! Resolves everything a pipeline run needs before any target is looked at:
//! - The project layout (source tree and build-output directory)
//! - The unit under test (top-level source artifact)
//! - The external tool programs (compiler, simulator, waveform viewer)
//!
//! # Configuration Hierarchy
//!
//! Values are merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Override file (`./simflow.toml`)
//! 3. Environment variables (`SIMFLOW_UNIT`, `SIMFLOW_BUILD_DIR`)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use simflow_config::ConfigLoader;
//!
//! let config = ConfigLoader::new(".")
//!     .with_unit(Some("counter/counter_tb".to_string()))
//!     .load()
//!     .unwrap();
//! println!("{}", config.unit);
//! ```

pub mod layout;
pub mod loader;
pub mod project;
pub mod unit;

use std::path::PathBuf;
use thiserror::Error;

/// Name of the optional override file looked up in the project directory
pub const OVERRIDE_FILE: &str = "simflow.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {}: {error}", .file.display())]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid project layout: {0}")]
    InvalidLayout(String),

    #[error(
        "No unit under test selected\n  \
         pass it on the command line: simflow --unit <path>\n  \
         or add `unit = \"<path>\"` to {}",
        .file.display()
    )]
    UnitNotSet { file: PathBuf },

    #[error(
        "Source for unit '{unit}' not found at {}\n  \
         pass an existing unit on the command line: simflow --unit <path>\n  \
         or fix `unit = \"<path>\"` in {}",
        .path.display(),
        .file.display()
    )]
    SourceNotFound {
        unit: String,
        path: PathBuf,
        file: PathBuf,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use layout::{Layout, SOURCE_EXTENSION};
pub use loader::{Config, ConfigLoader, ToolConfig};
pub use project::ProjectConfig;
pub use unit::UnitUnderTest;
