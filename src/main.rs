//! TaskTimer server binary.

use clap::Parser;
use std::process;
use tasktimer::cli::{resolve_db_path, Cli, Commands};
use tasktimer::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tasktimer=info")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    let result = match cli.command {
        Commands::Serve { host, port } => server::start_server(&db_path, &host, port).await,
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        process::exit(1);
    }
}
