//! Staleness resolution
//!
//! Two passes: the target graph materializes the full chain, then this module
//! walks it upstream-first. A link is stale when its output is missing, when
//! its dependency is at least as new as its output, or when any upstream link
//! is stale. The last rule is applied explicitly: a fast rebuild may leave an
//! intermediate artifact with a timestamp that does not look newer.

use crate::error::{BuildError, BuildResult};
use crate::targets::{Target, TargetKind};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Why a link must run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// Output does not exist
    Missing,
    /// Dependency modified at or after the output
    DependencyNewer { dependency: PathBuf },
    /// Dependency does not exist (it will be produced or the tool will fail)
    DependencyMissing { dependency: PathBuf },
    /// An upstream link runs, so this one has to follow
    AncestorRebuilt(TargetKind),
    /// Pseudo-target, runs every time it is requested
    Phony,
    /// Rebuild requested regardless of timestamps
    Forced,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "output missing"),
            Self::DependencyNewer { dependency } => {
                write!(f, "{} changed", dependency.display())
            }
            Self::DependencyMissing { dependency } => {
                write!(f, "{} missing", dependency.display())
            }
            Self::AncestorRebuilt(kind) => write!(f, "{} rebuilt", kind),
            Self::Phony => write!(f, "always runs"),
            Self::Forced => write!(f, "forced"),
        }
    }
}

/// Result of checking one link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale(StaleReason),
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh)
    }

    pub fn is_stale(&self) -> bool {
        !self.is_fresh()
    }
}

/// One chain link with its decision
#[derive(Debug, Clone)]
pub struct PlannedLink {
    pub target: Target,
    pub freshness: Freshness,
}

/// Ordered decisions for a chain, upstream first
#[derive(Debug, Clone, Default)]
pub struct Plan {
    links: Vec<PlannedLink>,
}

impl Plan {
    pub fn links(&self) -> &[PlannedLink] {
        &self.links
    }

    /// Targets whose recipes must run, in execution order
    pub fn stale(&self) -> impl Iterator<Item = &Target> {
        self.links
            .iter()
            .filter(|link| link.freshness.is_stale())
            .map(|link| &link.target)
    }

    /// Whether nothing needs to run
    pub fn is_up_to_date(&self) -> bool {
        self.stale().next().is_none()
    }
}

/// Decides which links of a chain must run
#[derive(Debug, Clone, Copy, Default)]
pub struct StalenessResolver {
    force: bool,
}

impl StalenessResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat every link as stale
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Walk a chain upstream-first and mark stale links
    pub fn resolve(&self, chain: Vec<Target>) -> BuildResult<Plan> {
        let mut links = Vec::with_capacity(chain.len());
        let mut rebuilt: Option<TargetKind> = None;

        for target in chain {
            let freshness = if self.force {
                Freshness::Stale(StaleReason::Forced)
            } else {
                match (direct_freshness(&target)?, rebuilt) {
                    (Freshness::Fresh, Some(upstream)) => {
                        Freshness::Stale(StaleReason::AncestorRebuilt(upstream))
                    }
                    (freshness, _) => freshness,
                }
            };

            debug!(kind = %target.kind, ?freshness, "staleness");
            if freshness.is_stale() && !target.kind.is_phony() {
                rebuilt = Some(target.kind);
            }
            links.push(PlannedLink { target, freshness });
        }

        Ok(Plan { links })
    }
}

/// Freshness of a single target from timestamps alone
///
/// Ties count as stale: with coarse filesystem timestamps an output written
/// in the same tick as its dependency cannot be trusted.
pub fn direct_freshness(target: &Target) -> BuildResult<Freshness> {
    match target.kind {
        TargetKind::View => return Ok(Freshness::Stale(StaleReason::Phony)),
        TargetKind::Clean => {
            return Ok(if target.output.exists() {
                Freshness::Stale(StaleReason::Phony)
            } else {
                Freshness::Fresh
            });
        }
        _ => {}
    }

    let output_time = match modified(&target.output)? {
        Some(time) => time,
        None => return Ok(Freshness::Stale(StaleReason::Missing)),
    };

    let Some(dependency) = &target.dependency else {
        return Ok(Freshness::Fresh);
    };
    let dependency = dependency.path();

    match modified(dependency)? {
        None => Ok(Freshness::Stale(StaleReason::DependencyMissing {
            dependency: dependency.to_path_buf(),
        })),
        Some(dependency_time) if dependency_time >= output_time => {
            Ok(Freshness::Stale(StaleReason::DependencyNewer {
                dependency: dependency.to_path_buf(),
            }))
        }
        Some(_) => Ok(Freshness::Fresh),
    }
}

/// Modification time, `None` when the path does not exist
fn modified(path: &Path) -> BuildResult<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(metadata) => metadata
            .modified()
            .map(Some)
            .map_err(|e| BuildError::io(path, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BuildError::io(path, e)),
    }
}
