use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    rstkit_server::run_with_cli(rstkit_server::cli::Cli::parse()).await
}
