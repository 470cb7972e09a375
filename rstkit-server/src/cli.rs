use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "rstkit-server",
    about = "HTTP backend for the rstkit editor: fragment formatting, document assembly and Sphinx builds"
)]
pub struct Cli {
    /// Path to rstkit.yml (defaults apply when the file is missing)
    #[arg(long, env = "RSTKIT_CONFIG", default_value = "rstkit.yml")]
    pub config: PathBuf,

    /// Listen address, overriding `server.listen_addr`
    #[arg(long, env = "RSTKIT_LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Bearer token for the HTTP object store
    #[arg(long, env = "RSTKIT_STORE_TOKEN", hide_env_values = true)]
    pub store_token: Option<String>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,
}
