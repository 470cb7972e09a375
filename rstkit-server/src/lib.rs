//! Library entrypoint for rstkit-server so the `rstkit` CLI can reuse the
//! server without shelling out.

pub mod cli;
pub mod server;

use anyhow::{Context, Result};
use rstkit_core::Config;
use tracing_subscriber::EnvFilter;

pub use server::{router, serve, ApiError, AppState};

pub fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Run the server using CLI args (parsed by the caller).
pub async fn run_with_cli(cli: cli::Cli) -> Result<()> {
    init_tracing(cli.verbose)?;

    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(addr) = cli.listen_addr {
        config.server.listen_addr = addr;
    }

    serve(config, cli.store_token).await
}
