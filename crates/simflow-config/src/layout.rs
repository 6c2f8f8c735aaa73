//! Project layout
//!
//! Where sources live and where build outputs go. The layout is an explicit
//! value handed to the target graph; nothing below the loader looks these
//! directories up on its own.

use crate::unit::UnitUnderTest;
use crate::{ConfigError, ConfigResult};
use std::path::{Component, Path, PathBuf};

/// File extension of hardware description sources
pub const SOURCE_EXTENSION: &str = "v";

/// Default source directory, relative to the project root
pub const DEFAULT_SOURCE_DIR: &str = "src";

/// Default build-output directory, relative to the project root
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Resolved project directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    source_dir: PathBuf,
    build_dir: PathBuf,
}

impl Layout {
    /// Create a layout; relative directories are resolved against `root`
    ///
    /// `.` and `..` are folded out before the directories are compared, so
    /// `out/..` is seen as the project root and rejected.
    pub fn new(
        root: impl Into<PathBuf>,
        source_dir: impl AsRef<Path>,
        build_dir: impl AsRef<Path>,
    ) -> ConfigResult<Self> {
        let root = normalize(&root.into());
        let source_dir = normalize(&root.join(source_dir));
        let build_dir = normalize(&root.join(build_dir));

        if root.starts_with(&build_dir) {
            return Err(ConfigError::InvalidLayout(format!(
                "build directory {} is the project root or one of its parents",
                build_dir.display()
            )));
        }
        if source_dir.starts_with(&build_dir) {
            return Err(ConfigError::InvalidLayout(format!(
                "build directory {} contains the source directory {}; clean would delete sources",
                build_dir.display(),
                source_dir.display()
            )));
        }

        Ok(Self {
            root,
            source_dir,
            build_dir,
        })
    }

    /// Layout with the default `src/` and `build/` directories
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            source_dir: root.join(DEFAULT_SOURCE_DIR),
            build_dir: root.join(DEFAULT_BUILD_DIR),
            root,
        }
    }

    /// Project root; external tools run with this as working directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source tree root
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Build-output directory
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Source file of a unit: `<sourcedir>/<unit>.v`
    pub fn source_path(&self, unit: &UnitUnderTest) -> PathBuf {
        self.source_dir.join(unit.with_extension(SOURCE_EXTENSION))
    }

    /// Output file of a unit in the build tree: `<outdir>/<unit>.<ext>`
    pub fn output_path(&self, unit: &UnitUnderTest, extension: &str) -> PathBuf {
        self.build_dir.join(unit.with_extension(extension))
    }

    /// Path as seen from the project root, for command lines and messages
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Fold `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_paths_mirror_unit() {
        let layout = Layout::with_defaults("/proj");
        let unit = UnitUnderTest::parse("counter/counter_tb").unwrap();

        assert_eq!(
            layout.source_path(&unit),
            PathBuf::from("/proj/src/counter/counter_tb.v")
        );
        assert_eq!(
            layout.output_path(&unit, "vvp"),
            PathBuf::from("/proj/build/counter/counter_tb.vvp")
        );
    }

    #[test]
    fn test_relative_strips_root() {
        let layout = Layout::with_defaults("/proj");
        assert_eq!(
            layout.relative(Path::new("/proj/build/top.vcd")),
            Path::new("build/top.vcd")
        );
        assert_eq!(layout.relative(Path::new("/elsewhere/x")), Path::new("/elsewhere/x"));
    }

    #[test]
    fn test_build_dir_must_not_contain_sources() {
        let err = Layout::new("/proj", "out/src", "out").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLayout(_)));

        let err = Layout::new("/proj", "src", ".").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLayout(_)));
    }

    #[test]
    fn test_parent_components_cannot_escape_the_check() {
        for build_dir in ["out/..", "..", "out/../..", "./sub/../."] {
            let err = Layout::new("/proj", "src", build_dir).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidLayout(_)),
                "{} should be rejected",
                build_dir
            );
        }

        let err = Layout::new("/proj", "src", "out/../src/..").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLayout(_)));
    }

    #[test]
    fn test_build_dir_outside_project() {
        let layout = Layout::new("/proj/hw", "src", "../sim_out").unwrap();
        assert_eq!(layout.build_dir(), Path::new("/proj/sim_out"));
        assert_eq!(layout.source_dir(), Path::new("/proj/hw/src"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/proj/out/..")), PathBuf::from("/proj"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("../a/./b")), PathBuf::from("../a/b"));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn test_custom_dirs() {
        let layout = Layout::new("/proj", "rtl", "sim_out").unwrap();
        assert_eq!(layout.source_dir(), Path::new("/proj/rtl"));
        assert_eq!(layout.build_dir(), Path::new("/proj/sim_out"));
    }
}
