mod commands;
mod shell;

use anyhow::{Context, Result};
use clap::Parser;
use commands::Command;
use mesadb::{
    Client,
    core::{config::StoreConfig, storage::FileBlobStore},
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

///
/// Cli
///

#[derive(Debug, Parser)]
#[command(name = "mesadb", version, about = "Inspect and edit a MesaDB data directory")]
struct Cli {
    /// Directory holding one JSON file per table.
    #[arg(long, env = "MESADB_DATA", value_name = "DIR", default_value = ".mesadb")]
    data: PathBuf,

    /// Key prefix; overrides the config file.
    #[arg(long, env = "MESADB_NAMESPACE", value_name = "NS")]
    namespace: Option<String>,

    /// JSON store config.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log executor traces (debug level).
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let client = open_client(&cli)?;
    match cli.command {
        Command::Shell => shell::run(&client).await,
        command => {
            let output = commands::run(&client, command).await?;
            println!("{}", output.text);
            if output.ok {
                Ok(())
            } else {
                anyhow::bail!("request failed")
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_client(cli: &Cli) -> Result<Client> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(namespace) = &cli.namespace {
        config.namespace.clone_from(namespace);
    }
    config.debug |= cli.verbose;

    let blobs = FileBlobStore::open(&cli.data)
        .with_context(|| format!("opening data directory {}", cli.data.display()))?;
    tracing::debug!(data = %cli.data.display(), namespace = %config.namespace, "opening store");

    Client::open(config, blobs).context("opening store")
}
