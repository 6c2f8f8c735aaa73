//! Status command - show the freshness of every target in the chain

use anyhow::{Context, Result};
use simflow_build::{
    status_line, Freshness, OutputMode, Pipeline, PipelineOptions, Reporter, TargetKind,
};
use simflow_config::ConfigLoader;

/// Print one line per link of `target`'s chain without running anything
pub fn run(loader: &ConfigLoader, target: TargetKind, options: PipelineOptions) -> Result<()> {
    let config = loader
        .load()
        .context("Failed to load project configuration")?;

    let pipeline = Pipeline::from_config(&config, options, Reporter::new(OutputMode::Quiet));
    let plan = pipeline.plan(target)?;
    let layout = pipeline.graph().layout();

    println!("{}", status_line("Unit", &config.unit));
    for link in plan.links() {
        let output = layout.relative(&link.target.output).display();
        let line = match &link.freshness {
            Freshness::Fresh => status_line("Fresh", format!("{} {}", link.target.kind, output)),
            Freshness::Stale(reason) => status_line(
                "Stale",
                format!("{} {} ({})", link.target.kind, output, reason),
            ),
        };
        println!("{}", line);
    }

    Ok(())
}
