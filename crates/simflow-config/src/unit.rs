//! Unit under test
//!
//! The identifier of the top-level source artifact: a relative path, without
//! extension, below the source directory (e.g. `counter/counter_tb`).

use crate::layout::SOURCE_EXTENSION;
use crate::{ConfigError, ConfigResult};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Identifier of the unit under test
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitUnderTest {
    path: PathBuf,
}

impl UnitUnderTest {
    /// Parse and normalize a unit identifier
    ///
    /// Accepts `/`-separated relative paths. A trailing source extension is
    /// stripped so `counter_tb.v` and `counter_tb` name the same unit.
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed
            .strip_suffix(&format!(".{}", SOURCE_EXTENSION))
            .unwrap_or(trimmed);

        if trimmed.is_empty() {
            return Err(invalid(raw, "unit cannot be empty"));
        }

        let mut path = PathBuf::new();
        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(invalid(raw, "unit must not leave the source directory"));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid(raw, "unit must be relative to the source directory"));
                }
            }
        }

        if path.as_os_str().is_empty() {
            return Err(invalid(raw, "unit cannot be empty"));
        }

        Ok(Self { path })
    }

    /// Relative path of the unit, without extension
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Unit path with the given extension appended
    ///
    /// Appends rather than replaces, so units containing dots keep their
    /// full name (`alu.v2` becomes `alu.v2.vvp`).
    pub fn with_extension(&self, extension: &str) -> PathBuf {
        let mut file = self.path.clone().into_os_string();
        file.push(".");
        file.push(extension);
        PathBuf::from(file)
    }
}

impl FromStr for UnitUnderTest {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UnitUnderTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self
            .path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        write!(f, "{}", parts.join("/"))
    }
}

fn invalid(raw: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: "unit".to_string(),
        reason: format!("{} (got '{}')", reason, raw),
    }
}
