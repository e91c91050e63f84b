mod cli;

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use edgeclass_backend_openvino::OpenvinoBackend;
use edgeclass_runtime::Prediction;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).context("invalid --log filter")?)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.pipeline_config();
    tracing::info!(
        model = %config.artifact.topology.display(),
        image = %config.image.display(),
        device = %config.device,
        "classifying"
    );

    let backend = OpenvinoBackend::new();
    let predictions = edgeclass_runtime::run(&backend, &config)
        .with_context(|| format!("classification on `{}` failed", config.device))?;

    report(&mut std::io::stdout().lock(), &predictions)?;
    Ok(())
}

fn report(out: &mut impl Write, predictions: &[Prediction]) -> Result<()> {
    for p in predictions {
        writeln!(out, "{p}")?;
    }
    out.flush()?;
    Ok(())
}
