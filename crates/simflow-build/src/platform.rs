//! Platform profiles
//!
//! A [`PlatformProfile`] maps each logical pipeline [`Action`] onto a concrete
//! [`Step`]: either an in-process filesystem operation or an external
//! [`Invocation`] with its arguments, working directory and stdio wiring.
//! Exactly one profile is chosen at startup ([`native`]); the target graph,
//! staleness resolver and validator never look at the platform.

use simflow_config::{Layout, ToolConfig};
use std::fmt;
use std::path::{Path, PathBuf};

/// Preprocessor symbol bound to the planned waveform-dump path
pub const DUMP_DEFINE: &str = "DUMP_FILE_NAME";

/// Logical pipeline action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Line on the user-visible log stream
    Print(String),
    /// Create the parent directory of an output file
    EnsureDirectory(PathBuf),
    /// Compile the source into a simulation image
    Compile {
        source: PathBuf,
        image: PathBuf,
        dump: PathBuf,
    },
    /// Run the simulation image without a terminal
    Simulate { image: PathBuf, log: PathBuf },
    /// Run the simulation image attached to the terminal
    SimulateInteractive { image: PathBuf, log: PathBuf },
    /// Open a waveform dump in the viewer, without waiting for it
    View { dump: PathBuf },
    /// Delete a directory tree
    RemoveTree(PathBuf),
    /// Delete a single file
    RemoveFile(PathBuf),
}

impl Action {
    /// Action name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Print(_) => "print",
            Self::EnsureDirectory(_) => "ensure-directory",
            Self::Compile { .. } => "compile",
            Self::Simulate { .. } => "simulate",
            Self::SimulateInteractive { .. } => "simulate-interactive",
            Self::View { .. } => "view",
            Self::RemoveTree(_) => "remove-tree",
            Self::RemoveFile(_) => "remove-file",
        }
    }
}

/// How a standard stream of a child process is wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Shared with the pipeline process (the user's terminal)
    Inherit,
    /// Connected to the null device
    Null,
}

/// Whether the pipeline waits for a child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Block until exit and check the status
    Blocking,
    /// Start and forget; the child may outlive the pipeline
    Detached,
}

/// Concrete external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub stdin: StdioMode,
    pub stdout: StdioMode,
    pub stderr: StdioMode,
    pub wait: WaitMode,
}

impl Invocation {
    /// Blocking invocation sharing the terminal
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            stdin: StdioMode::Inherit,
            stdout: StdioMode::Inherit,
            stderr: StdioMode::Inherit,
            wait: WaitMode::Blocking,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, mode: StdioMode) -> Self {
        self.stdin = mode;
        self
    }

    pub fn stdout(mut self, mode: StdioMode) -> Self {
        self.stdout = mode;
        self
    }

    pub fn stderr(mut self, mode: StdioMode) -> Self {
        self.stderr = mode;
        self
    }

    /// Start without waiting, all output suppressed
    pub fn detached(mut self) -> Self {
        self.wait = WaitMode::Detached;
        self.stdin = StdioMode::Null;
        self.stdout = StdioMode::Null;
        self.stderr = StdioMode::Null;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(word: &str) -> String {
    if !word.is_empty() && !word.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', "'\\''"))
}

/// What the dispatcher executes for one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Print(String),
    CreateDir(PathBuf),
    RemoveTree(PathBuf),
    RemoveFile(PathBuf),
    Run(Invocation),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Print(message) => write!(f, "{}", message),
            Self::CreateDir(path) => write!(f, "mkdir -p {}", path.display()),
            Self::RemoveTree(path) => write!(f, "rm -rf {}", path.display()),
            Self::RemoveFile(path) => write!(f, "rm -f {}", path.display()),
            Self::Run(invocation) => write!(f, "{}", invocation),
        }
    }
}

/// Inputs every profile needs to build an invocation
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Working directory of every external command
    pub root: PathBuf,
    /// Include-search root handed to the compiler
    pub source_dir: PathBuf,
    /// Tool programs
    pub tools: ToolConfig,
}

impl CommandContext {
    pub fn new(layout: &Layout, tools: ToolConfig) -> Self {
        Self {
            root: layout.root().to_path_buf(),
            source_dir: layout.source_dir().to_path_buf(),
            tools,
        }
    }

    /// Path relative to the working directory when it lies below it
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Platform-specific mapping from logical actions to external commands
pub trait PlatformProfile: fmt::Debug {
    /// Profile name
    fn name(&self) -> &'static str;

    /// Render a path argument for this platform's tools
    fn path_arg(&self, ctx: &CommandContext, path: &Path) -> String {
        ctx.relative(path).to_string_lossy().into_owned()
    }

    /// Compiler invocation: include path, relative includes, dump define
    fn compile(&self, ctx: &CommandContext, source: &Path, image: &Path, dump: &Path) -> Invocation;

    /// Non-interactive simulator invocation
    fn simulate(&self, ctx: &CommandContext, image: &Path, log: &Path) -> Invocation;

    /// Interactive simulator invocation
    fn simulate_interactive(&self, ctx: &CommandContext, image: &Path, log: &Path) -> Invocation;

    /// Detached viewer invocation
    fn view(&self, ctx: &CommandContext, dump: &Path) -> Invocation;

    /// Translate an action into the step to execute
    fn step(&self, action: &Action, ctx: &CommandContext) -> Step {
        match action {
            Action::Print(message) => Step::Print(message.clone()),
            Action::EnsureDirectory(output) => {
                let dir = output.parent().unwrap_or(output).to_path_buf();
                Step::CreateDir(dir)
            }
            Action::RemoveTree(path) => Step::RemoveTree(path.clone()),
            Action::RemoveFile(path) => Step::RemoveFile(path.clone()),
            Action::Compile {
                source,
                image,
                dump,
            } => Step::Run(self.compile(ctx, source, image, dump)),
            Action::Simulate { image, log } => Step::Run(self.simulate(ctx, image, log)),
            Action::SimulateInteractive { image, log } => {
                Step::Run(self.simulate_interactive(ctx, image, log))
            }
            Action::View { dump } => Step::Run(self.view(ctx, dump)),
        }
    }
}

/// Compiler arguments shared by both profiles; only the define value differs
fn compile_args(
    profile: &dyn PlatformProfile,
    ctx: &CommandContext,
    source: &Path,
    image: &Path,
    define_value: String,
) -> Vec<String> {
    let mut args = ctx.tools.compiler_flags.clone();
    args.extend([
        "-grelative-include".to_string(),
        "-I".to_string(),
        profile.path_arg(ctx, &ctx.source_dir),
        format!("-D{}=\"{}\"", DUMP_DEFINE, define_value),
        "-o".to_string(),
        profile.path_arg(ctx, image),
        profile.path_arg(ctx, source),
    ]);
    args
}

/// POSIX hosts: tools are spawned directly
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixProfile;

impl PlatformProfile for UnixProfile {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn compile(
        &self,
        ctx: &CommandContext,
        source: &Path,
        image: &Path,
        dump: &Path,
    ) -> Invocation {
        let define = self.path_arg(ctx, dump);
        Invocation::new(&ctx.tools.compiler, &ctx.root)
            .args(compile_args(self, ctx, source, image, define))
            .stdin(StdioMode::Null)
    }

    fn simulate(&self, ctx: &CommandContext, image: &Path, log: &Path) -> Invocation {
        Invocation::new(&ctx.tools.simulator, &ctx.root)
            .args(["-n".to_string(), "-l".to_string(), self.path_arg(ctx, log)])
            .arg(self.path_arg(ctx, image))
            .stdin(StdioMode::Null)
            .stdout(StdioMode::Null)
    }

    fn simulate_interactive(&self, ctx: &CommandContext, image: &Path, log: &Path) -> Invocation {
        Invocation::new(&ctx.tools.simulator, &ctx.root)
            .args(["-s".to_string(), "-l".to_string(), self.path_arg(ctx, log)])
            .arg(self.path_arg(ctx, image))
    }

    fn view(&self, ctx: &CommandContext, dump: &Path) -> Invocation {
        Invocation::new(&ctx.tools.viewer, &ctx.root)
            .arg(self.path_arg(ctx, dump))
            .detached()
    }
}

/// Windows hosts: the viewer goes through `start`, and the dump path baked
/// into the image uses forward slashes so it survives Verilog string escapes
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsProfile;

impl PlatformProfile for WindowsProfile {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn compile(
        &self,
        ctx: &CommandContext,
        source: &Path,
        image: &Path,
        dump: &Path,
    ) -> Invocation {
        let define = self.path_arg(ctx, dump).replace('\\', "/");
        Invocation::new(&ctx.tools.compiler, &ctx.root)
            .args(compile_args(self, ctx, source, image, define))
            .stdin(StdioMode::Null)
    }

    fn simulate(&self, ctx: &CommandContext, image: &Path, log: &Path) -> Invocation {
        Invocation::new(&ctx.tools.simulator, &ctx.root)
            .args(["-n".to_string(), "-l".to_string(), self.path_arg(ctx, log)])
            .arg(self.path_arg(ctx, image))
            .stdin(StdioMode::Null)
            .stdout(StdioMode::Null)
    }

    fn simulate_interactive(&self, ctx: &CommandContext, image: &Path, log: &Path) -> Invocation {
        Invocation::new(&ctx.tools.simulator, &ctx.root)
            .args(["-s".to_string(), "-l".to_string(), self.path_arg(ctx, log)])
            .arg(self.path_arg(ctx, image))
    }

    fn view(&self, ctx: &CommandContext, dump: &Path) -> Invocation {
        // `start` needs an explicit (empty) window title before the program
        Invocation::new("cmd", &ctx.root)
            .args(["/C", "start", ""])
            .arg(&ctx.tools.viewer)
            .arg(self.path_arg(ctx, dump))
            .detached()
    }
}

/// Profile for the host the pipeline was built for
pub fn native() -> Box<dyn PlatformProfile> {
    if cfg!(windows) {
        Box::new(WindowsProfile)
    } else {
        Box::new(UnixProfile)
    }
}
