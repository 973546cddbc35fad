use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use anexo_cli::cli::Cli;
use anexo_cli::commands;
use anexo_service::HttpService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let svc = match cli.api_key {
        Some(key) => HttpService::with_api_key(&cli.server_url, key),
        None => HttpService::new(&cli.server_url),
    };

    let mut stdout = std::io::stdout();
    commands::execute(&svc, cli.command, &mut stdout).await
}
