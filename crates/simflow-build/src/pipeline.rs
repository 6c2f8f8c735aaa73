//! Pipeline orchestration
//!
//! Resolves the chain for a requested operation, decides which links are
//! stale, runs their recipes in dependency order and validates the dump on
//! the simulate path. Runs are strictly sequential: one tool at a time.

use crate::dispatch::{remove_file, CommandDispatcher, ProcessRunner, SystemRunner};
use crate::error::BuildResult;
use crate::output::{status_line, Reporter};
use crate::platform::{self, Action, CommandContext};
use crate::staleness::{Freshness, Plan, StalenessResolver};
use crate::targets::{clean_target, Target, TargetGraph, TargetKind};
use crate::validate::Validator;
use simflow_config::{Config, Layout};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

/// User-facing pipeline operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Bring the compiled image up to date
    Compile,
    /// Bring the waveform dump up to date and validate it
    Simulate,
    /// Compile if needed, then run the simulation on the terminal
    SimulateInteractive,
    /// Bring the dump up to date, then open the viewer
    View,
    /// Remove the build directory
    Clean,
}

impl Operation {
    /// Command-line name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Simulate => "sim",
            Self::SimulateInteractive => "simi",
            Self::View => "wave",
            Self::Clean => "clean",
        }
    }

    /// Target the operation resolves its chain through
    pub fn target(&self) -> TargetKind {
        match self {
            Self::Compile | Self::SimulateInteractive => TargetKind::CompiledImage,
            Self::Simulate => TargetKind::WaveformDump,
            Self::View => TargetKind::View,
            Self::Clean => TargetKind::Clean,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Switches that change how a run treats its chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Run every recipe regardless of timestamps
    pub force: bool,
    /// Print actions instead of executing them
    pub dry_run: bool,
}

/// What a pipeline run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub operation: Operation,
    /// Targets whose recipes ran, in order
    pub executed: Vec<TargetKind>,
    /// Targets found up to date
    pub up_to_date: Vec<TargetKind>,
    /// Whether the dump was validated after a simulation
    pub validated: bool,
    /// Whether an interactive simulation ran
    pub interactive: bool,
    pub elapsed: Duration,
}

impl PipelineReport {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            executed: Vec::new(),
            up_to_date: Vec::new(),
            validated: false,
            interactive: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Whether no recipe ran at all
    pub fn is_noop(&self) -> bool {
        self.executed.is_empty() && !self.interactive
    }
}

/// Orchestrates one unit under test
pub struct Pipeline<R = SystemRunner> {
    graph: TargetGraph,
    dispatcher: CommandDispatcher<R>,
    resolver: StalenessResolver,
}

impl Pipeline<SystemRunner> {
    /// Pipeline for the host platform, running real tools
    pub fn from_config(config: &Config, options: PipelineOptions, reporter: Reporter) -> Self {
        let dispatcher = CommandDispatcher::new(
            platform::native(),
            CommandContext::new(&config.layout, config.tools.clone()),
            SystemRunner,
            reporter,
        )
        .with_dry_run(options.dry_run);

        Self::new(TargetGraph::from_config(config), dispatcher, options)
    }
}

impl<R: ProcessRunner> Pipeline<R> {
    pub fn new(
        graph: TargetGraph,
        dispatcher: CommandDispatcher<R>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            graph,
            dispatcher: dispatcher.with_dry_run(options.dry_run),
            resolver: StalenessResolver::new().with_force(options.force),
        }
    }

    pub fn graph(&self) -> &TargetGraph {
        &self.graph
    }

    pub fn dispatcher(&self) -> &CommandDispatcher<R> {
        &self.dispatcher
    }

    /// Run an operation
    pub fn run(&mut self, operation: Operation) -> BuildResult<PipelineReport> {
        match operation {
            Operation::Compile => self.compile(),
            Operation::Simulate => self.simulate(),
            Operation::SimulateInteractive => self.simulate_interactive(),
            Operation::View => self.view(),
            Operation::Clean => self.clean(),
        }
    }

    /// Bring the compiled image up to date
    pub fn compile(&mut self) -> BuildResult<PipelineReport> {
        self.execute(Operation::Compile)
    }

    /// Compile if needed, simulate, and require a waveform dump
    pub fn simulate(&mut self) -> BuildResult<PipelineReport> {
        self.execute(Operation::Simulate)
    }

    /// Compile if needed, then hand the terminal to the simulator
    ///
    /// The dump is neither checked for staleness nor validated; an
    /// interactive session may be ended by the user at any point.
    pub fn simulate_interactive(&mut self) -> BuildResult<PipelineReport> {
        let started = Instant::now();
        let mut report = self.execute(Operation::SimulateInteractive)?;

        for action in self.graph.interactive_recipe() {
            self.dispatcher.dispatch(&action)?;
        }
        report.interactive = true;
        report.elapsed = started.elapsed();
        Ok(report)
    }

    /// Bring the dump up to date, then launch the viewer
    pub fn view(&mut self) -> BuildResult<PipelineReport> {
        self.execute(Operation::View)
    }

    /// Remove the whole build directory
    pub fn clean(&mut self) -> BuildResult<PipelineReport> {
        clean(self.graph.layout(), &mut self.dispatcher)
    }

    /// Staleness decisions for a target's chain, without running anything
    pub fn plan(&self, kind: TargetKind) -> BuildResult<Plan> {
        self.resolver.resolve(self.graph.resolve(kind))
    }

    fn execute(&mut self, operation: Operation) -> BuildResult<PipelineReport> {
        let started = Instant::now();
        let mut report = PipelineReport::new(operation);
        info!(
            operation = %operation,
            unit = %self.graph.unit(),
            profile = self.dispatcher.profile().name(),
            "pipeline"
        );

        let plan = self.plan(operation.target())?;
        let reporter = *self.dispatcher.reporter();

        for link in plan.links() {
            let target = &link.target;
            match &link.freshness {
                Freshness::Fresh => {
                    reporter.verbose(&status_line("Fresh", self.describe(target)));
                    report.up_to_date.push(target.kind);
                }
                Freshness::Stale(reason) => {
                    reporter.verbose(&status_line(
                        "Stale",
                        format!("{}: {}", self.describe(target), reason),
                    ));
                    self.run_recipe(target)?;
                    report.executed.push(target.kind);

                    if target.kind == TargetKind::WaveformDump && !self.dispatcher.is_dry_run() {
                        Validator::require(&target.output)?;
                        report.validated = true;
                    }
                }
            }
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }

    fn run_recipe(&mut self, target: &Target) -> BuildResult<()> {
        for action in &target.recipe {
            if let Err(err) = self.dispatcher.dispatch(action) {
                // A failed or interrupted simulation may leave a partial dump
                if matches!(action, Action::Simulate { .. }) {
                    remove_file(&target.output)?;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn describe(&self, target: &Target) -> String {
        format!(
            "{} {}",
            target.kind,
            self.graph.layout().relative(&target.output).display()
        )
    }
}

/// Remove the build directory of a layout; needs no unit under test
pub fn clean<R: ProcessRunner>(
    layout: &Layout,
    dispatcher: &mut CommandDispatcher<R>,
) -> BuildResult<PipelineReport> {
    let started = Instant::now();
    let mut report = PipelineReport::new(Operation::Clean);
    info!(build_dir = %layout.build_dir().display(), "clean");

    let target = clean_target(layout);
    for action in &target.recipe {
        dispatcher.dispatch(action)?;
    }
    report.executed.push(TargetKind::Clean);
    report.elapsed = started.elapsed();
    Ok(report)
}
