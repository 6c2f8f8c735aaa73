//! Pipeline commands - compile, sim, simi and wave

use anyhow::{Context, Result};
use simflow_build::{status_line, Operation, Pipeline, PipelineOptions, Reporter};
use simflow_config::ConfigLoader;
use tracing::debug;

/// Run one pipeline operation for the configured unit
pub fn run(
    loader: &ConfigLoader,
    operation: Operation,
    options: PipelineOptions,
    reporter: Reporter,
) -> Result<()> {
    let config = loader
        .load()
        .context("Failed to load project configuration")?;
    debug!(root = %config.layout.root().display(), unit = %config.unit, ?options, "configured");

    let mut pipeline = Pipeline::from_config(&config, options, reporter);
    let report = pipeline.run(operation)?;

    if options.dry_run {
        return Ok(());
    }

    if report.is_noop() {
        reporter.status(&status_line("Fresh", format!("{} is up to date", config.unit)));
    } else {
        reporter.status(&status_line(
            "Finished",
            format!("{} in {:.2}s", operation, report.elapsed.as_secs_f64()),
        ));
    }

    Ok(())
}
