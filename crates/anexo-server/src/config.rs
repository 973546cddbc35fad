use std::net::SocketAddr;
use std::path::PathBuf;

use anexo_db::DbConfig;
use anexo_store::StoreConfig;
use clap::Args;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Server settings, read from flags or `ANEXO_*` environment variables.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "ANEXO_BIND", default_value = "0.0.0.0", global = true)]
    pub bind: String,

    /// Port to listen on
    #[arg(long, env = "ANEXO_PORT", default_value_t = 3720, global = true)]
    pub port: u16,

    /// SQLite database file
    #[arg(long, env = "ANEXO_DB_PATH", global = true)]
    pub db_path: Option<String>,

    /// Postgres connection URL; takes precedence over SQLite
    #[arg(long, env = "ANEXO_DATABASE_URL", hide_env_values = true, global = true)]
    pub database_url: Option<String>,

    /// Directory for the database and uploaded files
    #[arg(long, env = "ANEXO_DATA_DIR", global = true)]
    pub data_dir: Option<String>,

    /// Static API key accepted in addition to database keys
    #[arg(long, env = "ANEXO_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Owner the static API key acts for
    #[arg(long, env = "ANEXO_API_OWNER", default_value = "admin", global = true)]
    pub api_owner: String,

    /// Largest file accepted by POST /api/submissions, in bytes
    #[arg(
        long,
        env = "ANEXO_MAX_UPLOAD_BYTES",
        default_value_t = DEFAULT_MAX_UPLOAD_BYTES,
        global = true
    )]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(SocketAddr::new(self.bind.parse()?, self.port))
    }

    pub fn db_config(&self) -> DbConfig {
        let sqlite_path = self.db_path.clone().or_else(|| {
            self.data_dir
                .as_ref()
                .map(|dir| PathBuf::from(dir).join("anexo.db").to_string_lossy().into_owned())
        });
        DbConfig {
            sqlite_path,
            database_url: self.database_url.clone().filter(|u| !u.is_empty()),
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            local_data_dir: self
                .data_dir
                .as_ref()
                .map(|dir| PathBuf::from(dir).join("files").to_string_lossy().into_owned()),
        }
    }
}
