use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use simflow_build::{Operation, OutputMode, PipelineOptions, Reporter, TargetKind};
use simflow_config::ConfigLoader;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

/// Verilog simulation pipeline driver.
///
/// Compiles a unit under test with the hardware compiler, runs it to produce
/// a waveform dump, and opens the dump in a waveform viewer. Every step is
/// skipped when its output is newer than its input.
///
/// EXAMPLES:
///     simflow --unit alu/alu_tb          Compile src/alu/alu_tb.v
///     simflow sim --unit alu/alu_tb      Compile if needed, then simulate
///     simflow wave                       Simulate if needed, open the viewer
///     simflow simi                       Simulate attached to the terminal
///     simflow clean                      Remove the build directory
///
/// ENVIRONMENT VARIABLES:
///     SIMFLOW_UNIT       Unit under test when --unit is not given
///     SIMFLOW_BUILD_DIR  Build directory when --build-dir is not given
///     RUST_LOG           Diagnostic log filter
///     NO_COLOR           Set to disable colored output
#[derive(Parser)]
#[command(name = "simflow")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// Unit under test, relative to the source directory (`.v` optional)
    #[arg(long, global = true, value_name = "PATH")]
    unit: Option<String>,

    /// Build-output directory, relative to the project directory
    #[arg(long, global = true, value_name = "DIR")]
    build_dir: Option<PathBuf>,

    /// Project directory (defaults to the current directory)
    #[arg(long, short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Treat every target as out of date
    #[arg(long, short = 'B', global = true)]
    always_make: bool,

    /// Print what would run without running it
    #[arg(long, short = 'n', global = true)]
    dry_run: bool,

    /// Verbose output (repeat for diagnostic logs)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Quiet output (errors only)
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Compile the unit under test (default)
    Compile,

    /// Compile if needed, simulate and check the waveform dump
    Sim,

    /// Compile if needed, then simulate attached to the terminal
    ///
    /// The simulation always runs and its waveform dump is not checked.
    Simi,

    /// Simulate if needed, then open the dump in the waveform viewer
    Wave,

    /// Remove the build directory
    Clean,

    /// Show which targets are up to date
    Status {
        /// Last target of the chain to inspect
        #[arg(default_value = "waveform-dump", value_name = "TARGET")]
        target: TargetKind,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    if cli_config.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.global.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostic logs go to stderr; `-v` is taken by the status stream, so
/// tracing starts one level later. `RUST_LOG` wins when set.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 | 1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
    let root = match global.directory {
        Some(dir) => cwd.join(dir),
        None => cwd,
    };

    let loader = ConfigLoader::new(root)
        .with_unit(global.unit)
        .with_build_dir(global.build_dir);
    let reporter = Reporter::new(output_mode(global.quiet, global.verbose));
    let options = PipelineOptions {
        force: global.always_make,
        dry_run: global.dry_run,
    };

    match cli.command.unwrap_or(Commands::Compile) {
        Commands::Compile => commands::build::run(&loader, Operation::Compile, options, reporter),
        Commands::Sim => commands::build::run(&loader, Operation::Simulate, options, reporter),
        Commands::Simi => {
            commands::build::run(&loader, Operation::SimulateInteractive, options, reporter)
        }
        Commands::Wave => commands::build::run(&loader, Operation::View, options, reporter),
        Commands::Clean => commands::clean::run(&loader, options.dry_run, reporter),
        Commands::Status { target } => commands::status::run(&loader, target, options),
    }
}

fn output_mode(quiet: bool, verbose: u8) -> OutputMode {
    if quiet {
        OutputMode::Quiet
    } else if verbose > 0 {
        OutputMode::Verbose
    } else {
        OutputMode::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_compile() {
        let cli = Cli::try_parse_from(["simflow", "--unit", "top"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.global.unit.as_deref(), Some("top"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["simflow", "sim", "-B", "-n", "--unit", "alu/alu_tb"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Sim)));
        assert!(cli.global.always_make);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn test_status_target() {
        let cli = Cli::try_parse_from(["simflow", "status", "image"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Status {
                target: TargetKind::CompiledImage
            })
        ));

        let cli = Cli::try_parse_from(["simflow", "status"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Status {
                target: TargetKind::WaveformDump
            })
        ));

        assert!(Cli::try_parse_from(["simflow", "status", "bitstream"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["simflow", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_output_mode() {
        assert_eq!(output_mode(true, 0), OutputMode::Quiet);
        assert_eq!(output_mode(false, 0), OutputMode::Normal);
        assert_eq!(output_mode(false, 2), OutputMode::Verbose);
    }
}
