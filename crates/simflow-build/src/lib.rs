//! simflow build pipeline
//!
//! Drives a Verilog unit under test through compile, simulate and view:
//! - Fixed target graph (source, compiled image, waveform dump, log)
//! - Timestamp staleness with explicit ancestor propagation
//! - Platform profiles mapping logical actions to tool invocations
//! - Waveform dump validation after non-interactive simulation
//! - Status output modes (quiet, normal, verbose)

pub mod dispatch;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod staleness;
pub mod targets;
pub mod validate;

// Re-export main types
pub use dispatch::{CommandDispatcher, ExitOutcome, ProcessRunner, SystemRunner};
pub use error::{BuildError, BuildResult};
pub use output::{status_line, OutputMode, Reporter};
pub use pipeline::{Operation, Pipeline, PipelineOptions, PipelineReport};
pub use platform::{
    Action, CommandContext, Invocation, PlatformProfile, StdioMode, Step, UnixProfile, WaitMode,
    WindowsProfile, DUMP_DEFINE,
};
pub use staleness::{Freshness, Plan, PlannedLink, StaleReason, StalenessResolver};
pub use targets::{clean_target, Dependency, Target, TargetGraph, TargetKind};
pub use validate::{DumpCheck, Validator};

// Re-export config types for convenience
pub use simflow_config::{Config, ConfigLoader, Layout, ToolConfig, UnitUnderTest};
