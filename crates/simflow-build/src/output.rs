//! User-visible status output
//!
//! Three levels controlled by CLI flags:
//! - **Quiet** (`-q`): nothing but errors
//! - **Normal**: one status line per recipe (`Compiling`, `Simulating`, ...)
//! - **Verbose** (`-v`): also fresh targets, stale reasons and command lines

use crate::platform::Invocation;

/// Output verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum OutputMode {
    /// Errors only
    Quiet,
    /// Status lines
    #[default]
    Normal,
    /// Everything
    Verbose,
}

/// Format a cargo-style status line: right-aligned verb, then the message
pub fn status_line(verb: &str, message: impl std::fmt::Display) -> String {
    format!("{:>12} {}", verb, message)
}

/// Writes the pipeline's log stream to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    mode: OutputMode,
}

impl Reporter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Print a status line unless quiet
    pub fn status(&self, line: &str) {
        if self.mode >= OutputMode::Normal {
            println!("{}", line);
        }
    }

    /// Print a line in verbose mode only
    pub fn verbose(&self, line: &str) {
        if self.mode == OutputMode::Verbose {
            println!("{}", line);
        }
    }

    /// Echo an external command line in verbose mode
    pub fn command(&self, invocation: &Invocation) {
        self.verbose(&status_line("Running", format!("`{}`", invocation)));
    }

    /// Print a command that a dry run would execute
    pub fn dry_run(&self, what: impl std::fmt::Display) {
        if self.mode >= OutputMode::Normal {
            println!("{}", what);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_alignment() {
        assert_eq!(status_line("Compiling", "top"), "   Compiling top");
        assert_eq!(status_line("Simulating", "top"), "  Simulating top");
    }

    #[test]
    fn test_mode_ordering() {
        assert!(OutputMode::Quiet < OutputMode::Normal);
        assert!(OutputMode::Normal < OutputMode::Verbose);
        assert_eq!(Reporter::default().mode(), OutputMode::Normal);
    }
}
