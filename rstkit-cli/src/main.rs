//! # rstkit CLI
//!
//! Command-line interface for formatting reStructuredText fragments,
//! assembling documents, and building them with Sphinx.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rstkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, env = "RSTKIT_CONFIG", default_value = "rstkit.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new rstkit project
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Format a single fragment and print it
    Format {
        /// Fragment kind (title, bold, csv_table, codeblock, ...)
        #[arg(required_unless_present = "list")]
        kind: Option<String>,

        /// Field values as a JSON object
        #[arg(long, default_value = "{}")]
        fields: String,

        /// List known kinds instead of formatting
        #[arg(long)]
        list: bool,
    },

    /// Join fragments from a JSON file into one document
    Assemble {
        /// JSON array of fragments (strings or {kind, fields} objects)
        input: PathBuf,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Assemble fragments and build them into a zipped site
    Build {
        /// JSON array of fragments (strings or {kind, fields} objects)
        input: PathBuf,

        /// Archive path (defaults to build.archive_name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Publish a file to the configured object store
    Publish {
        /// File to publish
        file: PathBuf,

        /// Name to publish under (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        /// Bearer token for the HTTP object store
        #[arg(long, env = "RSTKIT_STORE_TOKEN", hide_env_values = true)]
        store_token: Option<String>,
    },

    /// Run the HTTP server for the editor frontend
    Serve {
        /// Listen address, overriding server.listen_addr
        #[arg(long, env = "RSTKIT_LISTEN_ADDR")]
        addr: Option<String>,

        /// Bearer token for the HTTP object store
        #[arg(long, env = "RSTKIT_STORE_TOKEN", hide_env_values = true)]
        store_token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output.
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => commands::init_project(path.as_deref()),
        Commands::Format { kind, fields, list } => {
            match kind {
                Some(kind) if !list => commands::format_fragment(&kind, &fields),
                _ => {
                    commands::list_kinds();
                    Ok(())
                }
            }
        }
        Commands::Assemble { input, output } => {
            commands::assemble_document(&input, output.as_deref())
        }
        Commands::Build { input, output } => {
            commands::build_archive(&cli.config, &input, output.as_deref()).await
        }
        Commands::Publish {
            file,
            name,
            store_token,
        } => commands::publish_file(&cli.config, &file, name.as_deref(), store_token).await,
        Commands::Serve { addr, store_token } => {
            commands::serve(&cli.config, addr, store_token).await
        }
    }
}
