//! CLI configuration via environment variables
//!
//! Project settings live in `simflow.toml`; this only covers how the CLI
//! itself presents output.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Disable colored output (SIMFLOW_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            no_color: env::var_os("SIMFLOW_NO_COLOR").is_some()
                || env::var_os("NO_COLOR").is_some(),
        }
    }
}
