use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use anexo_server::auth;
use anexo_server::config::ServerConfig;

#[derive(Parser)]
#[command(name = "anexo-server", about = "Internship document submission server")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new API key
    Keygen {
        /// Human-readable name for the key
        #[arg(long, default_value = "")]
        name: String,
        /// Owner the key acts for
        #[arg(long)]
        owner: String,
    },
    /// List all API keys (metadata only, no secrets)
    ListKeys,
    /// Revoke (delete) an API key by ID
    RevokeKey {
        /// The API key ID to revoke
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;
    let db = anexo_db::open_database(&config.db_config()).await?;

    match cli.command {
        Some(Commands::Keygen { name, owner }) => {
            let raw_key = auth::generate_api_key();
            let hash = auth::sha256_hex(&raw_key);
            let api_key = db.insert_api_key(&name, &owner, &hash).await?;
            eprintln!("Created API key (id: {}) for {owner}", api_key.id);
            if !name.is_empty() {
                eprintln!("  name: {name}");
            }
            // Print the raw key to stdout so it can be captured
            println!("{raw_key}");
            eprintln!("\nSave this key, it cannot be retrieved again.");
        }
        Some(Commands::ListKeys) => {
            let keys = db.list_api_keys().await?;
            if keys.is_empty() {
                eprintln!("No API keys found.");
            } else {
                println!(
                    "{:<38} {:<20} {:<16} {:<28} LAST USED",
                    "ID", "NAME", "OWNER", "CREATED"
                );
                for key in keys {
                    println!(
                        "{:<38} {:<20} {:<16} {:<28} {}",
                        key.id,
                        if key.name.is_empty() { "-" } else { &key.name },
                        key.owner,
                        key.created_at,
                        key.last_used_at.as_deref().unwrap_or("never"),
                    );
                }
            }
        }
        Some(Commands::RevokeKey { id }) => {
            db.delete_api_key(&id).await?;
            eprintln!("Revoked API key {id}");
        }
        None => {
            let addr = config.addr()?;
            let store = anexo_store::create_store(&config.store_config());

            let auth =
                auth::build_auth_config(db.clone(), config.api_key.as_deref(), &config.api_owner)
                    .await;
            if auth.is_some() {
                tracing::info!("authentication enabled");
            } else {
                tracing::warn!(
                    "authentication disabled (no ANEXO_API_KEY or DB keys), acting as owner '{}'",
                    auth::LOCAL_OWNER
                );
            }

            let listener = TcpListener::bind(addr).await?;
            tracing::info!("anexo-server listening on http://{addr}");

            anexo_server::serve(listener, db, store, auth, config.max_upload_bytes).await?;
        }
    }

    Ok(())
}
