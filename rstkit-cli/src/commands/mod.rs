//! CLI command implementations.

pub mod assemble;
pub mod build;
pub mod format;
pub mod init;
pub mod input;
pub mod publish;
pub mod serve;

pub use assemble::assemble_document;
pub use build::build_archive;
pub use format::{format_fragment, list_kinds};
pub use init::init_project;
pub use publish::publish_file;
pub use serve::serve;

use anyhow::{Context, Result};
use rstkit_core::Config;
use std::path::Path;

/// Load `rstkit.yml`, falling back to defaults when it does not exist.
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    Config::load_or_default(path).with_context(|| format!("Failed to load {:?}", path))
}
