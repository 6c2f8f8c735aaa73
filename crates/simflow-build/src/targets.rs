//! Target graph
//!
//! A fixed chain `source -> compiled-image -> waveform-dump` plus the
//! simulation log (side effect of the dump recipe), the `view` pseudo-target
//! on top of the dump, and the `clean` pseudo-target owning the whole build
//! directory. All paths derive from the layout and the unit under test.

use crate::error::BuildError;
use crate::output::status_line;
use crate::platform::Action;
use simflow_config::{Config, Layout, UnitUnderTest};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Kind of target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Executable simulation image
    CompiledImage,
    /// Waveform dump written by the simulation
    WaveformDump,
    /// Textual simulation log, produced alongside the dump
    Log,
    /// Open the dump in the viewer
    View,
    /// Remove the build directory
    Clean,
}

impl TargetKind {
    /// File extension of the output, for targets that produce one file
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::CompiledImage => Some("vvp"),
            Self::WaveformDump => Some("vcd"),
            Self::Log => Some("log"),
            Self::View | Self::Clean => None,
        }
    }

    /// Upstream target; `None` means the target depends on the raw source
    /// file (`CompiledImage`) or on nothing at all (`Clean`)
    pub fn dependency(&self) -> Option<TargetKind> {
        match self {
            Self::CompiledImage | Self::Clean => None,
            Self::WaveformDump | Self::Log => Some(Self::CompiledImage),
            Self::View => Some(Self::WaveformDump),
        }
    }

    /// Pseudo-targets do not produce a file of their own
    pub fn is_phony(&self) -> bool {
        matches!(self, Self::View | Self::Clean)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompiledImage => write!(f, "compiled-image"),
            Self::WaveformDump => write!(f, "waveform-dump"),
            Self::Log => write!(f, "log"),
            Self::View => write!(f, "view"),
            Self::Clean => write!(f, "clean"),
        }
    }
}

impl FromStr for TargetKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compiled-image" | "image" => Ok(Self::CompiledImage),
            "waveform-dump" | "dump" => Ok(Self::WaveformDump),
            "log" => Ok(Self::Log),
            "view" => Ok(Self::View),
            "clean" => Ok(Self::Clean),
            other => Err(BuildError::InvalidTarget(other.to_string())),
        }
    }
}

/// What a target is compared against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Hand-written source file
    Source(PathBuf),
    /// Output of an upstream target
    Target { kind: TargetKind, output: PathBuf },
}

impl Dependency {
    pub fn path(&self) -> &Path {
        match self {
            Self::Source(path) => path,
            Self::Target { output, .. } => output,
        }
    }
}

/// A build product with the recipe that regenerates it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub kind: TargetKind,
    pub output: PathBuf,
    pub dependency: Option<Dependency>,
    pub recipe: Vec<Action>,
}

/// Targets for one unit under test
#[derive(Debug, Clone)]
pub struct TargetGraph {
    layout: Layout,
    unit: UnitUnderTest,
}

impl TargetGraph {
    pub fn new(layout: Layout, unit: UnitUnderTest) -> Self {
        Self { layout, unit }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.layout.clone(), config.unit.clone())
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn unit(&self) -> &UnitUnderTest {
        &self.unit
    }

    /// `<sourcedir>/<unit>.v`
    pub fn source_path(&self) -> PathBuf {
        self.layout.source_path(&self.unit)
    }

    /// Output path of a target kind
    ///
    /// `View` reports the dump it opens, `Clean` the build directory.
    pub fn output_path(&self, kind: TargetKind) -> PathBuf {
        match kind.extension() {
            Some(extension) => self.layout.output_path(&self.unit, extension),
            None if kind == TargetKind::View => self.output_path(TargetKind::WaveformDump),
            None => self.layout.build_dir().to_path_buf(),
        }
    }

    /// Build a single target with its dependency and recipe
    pub fn target(&self, kind: TargetKind) -> Target {
        if kind == TargetKind::Clean {
            return clean_target(&self.layout);
        }

        let dependency = match kind.dependency() {
            Some(upstream) => Some(Dependency::Target {
                kind: upstream,
                output: self.output_path(upstream),
            }),
            None => Some(Dependency::Source(self.source_path())),
        };

        Target {
            kind,
            output: self.output_path(kind),
            dependency,
            recipe: self.recipe(kind),
        }
    }

    /// Ordered chain from the root dependency down to `kind`
    ///
    /// The log has no recipe of its own; asking for it resolves the dump
    /// chain that writes it.
    pub fn resolve(&self, kind: TargetKind) -> Vec<Target> {
        let kinds: &[TargetKind] = match kind {
            TargetKind::CompiledImage => &[TargetKind::CompiledImage],
            TargetKind::WaveformDump | TargetKind::Log => {
                &[TargetKind::CompiledImage, TargetKind::WaveformDump]
            }
            TargetKind::View => &[
                TargetKind::CompiledImage,
                TargetKind::WaveformDump,
                TargetKind::View,
            ],
            TargetKind::Clean => &[TargetKind::Clean],
        };
        kinds.iter().map(|kind| self.target(*kind)).collect()
    }

    /// Actions for an interactive run of the compiled image
    pub fn interactive_recipe(&self) -> Vec<Action> {
        let log = self.output_path(TargetKind::Log);
        vec![
            Action::Print(status_line("Running", format!("{} (interactive)", self.unit))),
            Action::EnsureDirectory(log.clone()),
            Action::SimulateInteractive {
                image: self.output_path(TargetKind::CompiledImage),
                log,
            },
        ]
    }

    fn recipe(&self, kind: TargetKind) -> Vec<Action> {
        let image = self.output_path(TargetKind::CompiledImage);
        let dump = self.output_path(TargetKind::WaveformDump);

        match kind {
            TargetKind::CompiledImage => {
                let source = self.source_path();
                vec![
                    Action::Print(status_line(
                        "Compiling",
                        format!("{} ({})", self.unit, self.layout.relative(&source).display()),
                    )),
                    Action::EnsureDirectory(image.clone()),
                    Action::Compile {
                        source,
                        image,
                        dump,
                    },
                ]
            }
            TargetKind::WaveformDump | TargetKind::Log => vec![
                Action::Print(status_line("Simulating", &self.unit)),
                Action::EnsureDirectory(dump.clone()),
                // A dump left over from an earlier run must never pass validation
                Action::RemoveFile(dump),
                Action::Simulate {
                    image,
                    log: self.output_path(TargetKind::Log),
                },
            ],
            TargetKind::View => vec![
                Action::Print(status_line("Opening", self.layout.relative(&dump).display())),
                Action::View { dump },
            ],
            TargetKind::Clean => clean_target(&self.layout).recipe,
        }
    }
}

/// The `clean` pseudo-target; needs no unit under test
pub fn clean_target(layout: &Layout) -> Target {
    let build_dir = layout.build_dir().to_path_buf();
    Target {
        kind: TargetKind::Clean,
        output: build_dir.clone(),
        dependency: None,
        recipe: vec![
            Action::Print(status_line("Removing", layout.relative(&build_dir).display())),
            Action::RemoveTree(build_dir),
        ],
    }
}
