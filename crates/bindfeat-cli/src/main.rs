//! bindfeat: protein-ligand binding feature aggregation.
//! Entry point for the command-line binary.

mod config;
mod output;

use std::time::Instant;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bindfeat_features::FeaturePipeline;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bindfeat=info,bindfeat_features=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let cli = config::Cli::parse();
    if let Some(ref path) = cli.config {
        info!("Config: {}", path.display());
    }
    let config = cli.into_config()?;

    let started = Instant::now();
    let pipeline = FeaturePipeline::new(config)?;
    let output = pipeline.run()?;

    let out = &pipeline.config().output;
    if out.fail_on_empty && output.table.is_empty() {
        anyhow::bail!(
            "Final table '{}' is empty; nothing written to {}",
            out.name,
            out.dir.display()
        );
    }

    let written = output::write_outputs(out, &output)?;
    info!(
        rows = output.table.row_count(),
        columns = output.table.column_count(),
        files = written.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Feature table ready: {}",
        out.dir.join(format!("{}.csv", out.name)).display()
    );
    Ok(())
}
