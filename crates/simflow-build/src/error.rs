//! Pipeline error types

use crate::platform::DUMP_DEFINE;
use simflow_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{action} failed: `{program}` {}", describe_exit(.code))]
    ToolFailed {
        action: &'static str,
        program: String,
        code: Option<i32>,
    },

    #[error("`{program}` not found; install it or set its path in simflow.toml")]
    ToolNotFound { program: String },

    #[error("Failed to start `{program}`: {error}")]
    Spawn {
        program: String,
        error: std::io::Error,
    },

    #[error(
        "Simulation finished but no waveform dump was written to {}\n  \
         the unit's initial block must request dump generation:\n      \
         $dumpfile(`{define});\n      \
         $dumpvars;",
        .path.display(),
        define = DUMP_DEFINE
    )]
    MissingDump { path: PathBuf },

    #[error("I/O error at {}: {error}", .path.display())]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a tool failure error
    pub fn tool_failed(
        action: &'static str,
        program: impl Into<String>,
        code: Option<i32>,
    ) -> Self {
        Self::ToolFailed {
            action,
            program: program.into(),
            code,
        }
    }

    /// Map a process start failure, singling out a missing executable
    pub fn spawn(program: impl Into<String>, error: std::io::Error) -> Self {
        let program = program.into();
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::ToolNotFound { program }
        } else {
            Self::Spawn { program, error }
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failed_message() {
        let err = BuildError::tool_failed("compile", "iverilog", Some(2));
        assert_eq!(err.to_string(), "compile failed: `iverilog` exited with status 2");

        let err = BuildError::tool_failed("simulate", "vvp", None);
        assert!(err.to_string().contains("terminated by a signal"));
    }

    #[test]
    fn test_missing_dump_names_both_directives() {
        let err = BuildError::MissingDump {
            path: PathBuf::from("build/top.vcd"),
        };
        let message = err.to_string();
        assert!(message.contains("build/top.vcd"));
        assert!(message.contains("$dumpfile(`DUMP_FILE_NAME)"));
        assert!(message.contains("$dumpvars"));
    }

    #[test]
    fn test_spawn_not_found() {
        let err = BuildError::spawn(
            "gtkwave",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(matches!(err, BuildError::ToolNotFound { ref program } if program == "gtkwave"));

        let err = BuildError::spawn(
            "gtkwave",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, BuildError::Spawn { .. }));
    }
}
