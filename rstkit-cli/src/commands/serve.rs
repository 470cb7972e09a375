//! Serve command implementation.

use anyhow::Result;
use std::path::Path;

use super::load_config;

pub async fn serve(
    config_path: &Path,
    addr: Option<String>,
    store_token: Option<String>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(addr) = addr {
        config.server.listen_addr = addr;
    }
    rstkit_server::serve(config, store_token).await
}
