//! Build command implementation.

use anyhow::{Context, Result};
use rstkit_build::{BuildOrchestrator, BuildSettings};
use std::path::Path;

use super::input::read_input;
use super::load_config;

pub async fn build_archive(config_path: &Path, input: &Path, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let document = read_input(input)?.render()?;

    let orchestrator = BuildOrchestrator::new(BuildSettings::from_config(&config));
    let artifact = orchestrator.build(&document).await?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| artifact.file_name.clone().into());
    tokio::fs::write(&output, &artifact.bytes)
        .await
        .with_context(|| format!("Failed to write {:?}", output))?;

    println!("✓ Built {:?} ({} bytes)", output, artifact.bytes.len());
    if let Some(retained) = orchestrator.retained_path() {
        println!("  Rendered output kept in {:?}", retained);
    }
    Ok(())
}
