//! Clean command - remove the build directory

use anyhow::{Context, Result};
use simflow_build::platform::native;
use simflow_build::{
    pipeline, CommandContext, CommandDispatcher, Reporter, SystemRunner, ToolConfig,
};
use simflow_config::ConfigLoader;

/// Remove the build directory; works without a unit under test
pub fn run(loader: &ConfigLoader, dry_run: bool, reporter: Reporter) -> Result<()> {
    let layout = loader
        .load_layout()
        .context("Failed to load project configuration")?;

    let mut dispatcher = CommandDispatcher::new(
        native(),
        CommandContext::new(&layout, ToolConfig::default()),
        SystemRunner,
        reporter,
    )
    .with_dry_run(dry_run);

    pipeline::clean(&layout, &mut dispatcher)?;
    Ok(())
}
