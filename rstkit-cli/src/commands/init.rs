//! Init command implementation.

use anyhow::{Context, Result};
use rstkit_build::templates::write_default_templates;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../../rstkit.yml.example");

/// Initialize a new rstkit project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_config(root)?;
    scaffold_templates(root)?;

    println!("✓ rstkit initialized in {:?}", root);
    println!("  - Edit rstkit.yml to point at your sphinx-build and object store");
    println!("  - Adjust templates/source/conf.py to change the Sphinx theme");
    Ok(())
}

fn write_config(root: &Path) -> Result<()> {
    let config_path = root.join("rstkit.yml");
    if config_path.exists() {
        println!("rstkit.yml already exists at {:?}", config_path);
        return Ok(());
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;
    println!("Created {:?}", config_path);
    Ok(())
}

fn scaffold_templates(root: &Path) -> Result<()> {
    let templates = root.join("templates");
    let written = write_default_templates(&templates)
        .with_context(|| format!("Failed to write templates into {:?}", templates))?;
    for path in written {
        println!("Created {:?}", path);
    }
    Ok(())
}
