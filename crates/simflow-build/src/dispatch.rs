//! Command dispatch
//!
//! Translates logical actions through the active [`PlatformProfile`] and
//! executes the resulting steps. External processes go through a
//! [`ProcessRunner`] so tests can stand in for the real tools.

use crate::error::{BuildError, BuildResult};
use crate::output::Reporter;
use crate::platform::{
    Action, CommandContext, Invocation, PlatformProfile, StdioMode, Step, WaitMode,
};
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Exit status of a finished child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn with_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Starts external processes
pub trait ProcessRunner {
    /// Run to completion and report the exit status
    fn run(&mut self, invocation: &Invocation) -> io::Result<ExitOutcome>;

    /// Start without waiting
    fn spawn_detached(&mut self, invocation: &Invocation) -> io::Result<()>;
}

/// Runs invocations with `std::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(invocation: &Invocation) -> Command {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(stdio(invocation.stdin))
            .stdout(stdio(invocation.stdout))
            .stderr(stdio(invocation.stderr));
        command
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<ExitOutcome> {
        let status = Self::command(invocation).status()?;
        Ok(ExitOutcome {
            code: status.code(),
        })
    }

    fn spawn_detached(&mut self, invocation: &Invocation) -> io::Result<()> {
        // The child is never waited on; it keeps running after we exit
        Self::command(invocation).spawn().map(drop)
    }
}

fn stdio(mode: StdioMode) -> Stdio {
    match mode {
        StdioMode::Inherit => Stdio::inherit(),
        StdioMode::Null => Stdio::null(),
    }
}

/// Executes logical actions for one platform
pub struct CommandDispatcher<R> {
    profile: Box<dyn PlatformProfile>,
    context: CommandContext,
    runner: R,
    reporter: Reporter,
    dry_run: bool,
}

impl<R: ProcessRunner> CommandDispatcher<R> {
    pub fn new(
        profile: Box<dyn PlatformProfile>,
        context: CommandContext,
        runner: R,
        reporter: Reporter,
    ) -> Self {
        Self {
            profile,
            context,
            runner,
            reporter,
            dry_run: false,
        }
    }

    /// Print steps instead of executing them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn profile(&self) -> &dyn PlatformProfile {
        self.profile.as_ref()
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    /// The step an action maps to, without executing it
    pub fn step(&self, action: &Action) -> Step {
        self.profile.step(action, &self.context)
    }

    /// Execute one action
    ///
    /// A non-zero exit of a blocking tool is an error. Filesystem steps are
    /// idempotent: creating an existing directory or removing a missing path
    /// succeeds.
    pub fn dispatch(&mut self, action: &Action) -> BuildResult<()> {
        let step = self.step(action);
        debug!(action = action.name(), step = %step, "dispatch");

        if self.dry_run {
            match &step {
                Step::Print(message) => self.reporter.status(message),
                other => self.reporter.dry_run(other),
            }
            return Ok(());
        }

        match step {
            Step::Print(message) => {
                self.reporter.status(&message);
                Ok(())
            }
            Step::CreateDir(dir) => fs::create_dir_all(&dir).map_err(|e| BuildError::io(dir, e)),
            Step::RemoveTree(path) => remove_tree(&path),
            Step::RemoveFile(path) => remove_file(&path),
            Step::Run(invocation) => self.run(action, &invocation),
        }
    }

    fn run(&mut self, action: &Action, invocation: &Invocation) -> BuildResult<()> {
        self.reporter.command(invocation);

        match invocation.wait {
            WaitMode::Detached => self
                .runner
                .spawn_detached(invocation)
                .map_err(|e| BuildError::spawn(&invocation.program, e)),
            WaitMode::Blocking => {
                let outcome = self
                    .runner
                    .run(invocation)
                    .map_err(|e| BuildError::spawn(&invocation.program, e))?;
                debug!(program = %invocation.program, code = ?outcome.code, "tool exited");

                if outcome.is_success() {
                    Ok(())
                } else {
                    Err(BuildError::tool_failed(
                        action.name(),
                        &invocation.program,
                        outcome.code,
                    ))
                }
            }
        }
    }
}

/// Remove a directory tree; a missing path is not an error
pub fn remove_tree(path: &Path) -> BuildResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::io(path, e)),
    }
}

/// Remove a single file; a missing path is not an error
pub fn remove_file(path: &Path) -> BuildResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::io(path, e)),
    }
}
