//! Assemble command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::input::read_input;

pub fn assemble_document(input: &Path, output: Option<&Path>) -> Result<()> {
    let document = read_input(input)?.render()?;

    match output {
        Some(path) => {
            fs::write(path, &document).with_context(|| format!("Failed to write {:?}", path))?;
            println!("Wrote {:?} ({} bytes)", path, document.len());
        }
        None => print!("{document}"),
    }
    Ok(())
}
