//! Waveform dump validation
//!
//! A simulator exits successfully whether or not the design asked for a dump,
//! so exit status alone cannot tell whether a waveform was produced.

use crate::dispatch::remove_file;
use crate::error::{BuildError, BuildResult};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Outcome of a dump check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpCheck {
    Present,
    Missing,
}

/// Checks the dump after a non-interactive simulation
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    /// `Present` for a non-empty file, `Missing` otherwise
    pub fn check(dump: &Path) -> DumpCheck {
        match fs::metadata(dump) {
            Ok(metadata) if metadata.is_file() && metadata.len() > 0 => DumpCheck::Present,
            _ => DumpCheck::Missing,
        }
    }

    /// Fail with a remediation hint when the dump is missing
    ///
    /// An empty file left behind is removed so the next run sees the dump
    /// as absent.
    pub fn require(dump: &Path) -> BuildResult<()> {
        match Self::check(dump) {
            DumpCheck::Present => Ok(()),
            DumpCheck::Missing => {
                debug!(dump = %dump.display(), "waveform dump missing");
                if dump.is_file() {
                    remove_file(dump)?;
                }
                Err(BuildError::MissingDump {
                    path: dump.to_path_buf(),
                })
            }
        }
    }
}
