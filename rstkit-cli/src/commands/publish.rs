//! Publish command implementation.

use anyhow::{bail, Context, Result};
use rstkit_store::{open_store, ArtifactPublisher};
use std::path::Path;

use super::load_config;

pub async fn publish_file(
    config_path: &Path,
    file: &Path,
    name: Option<&str>,
    store_token: Option<String>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let Some(store) = open_store(&config, store_token).context("Failed to open object store")?
    else {
        bail!("No object store configured in {:?}", config_path);
    };

    let name = match name {
        Some(name) => name.to_string(),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let content = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))?;

    let stored = ArtifactPublisher::new(store)
        .publish(&name, &content)
        .await
        .with_context(|| format!("Failed to publish {:?}", file))?;
    println!("{stored}");
    Ok(())
}
