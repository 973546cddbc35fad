mod local;

pub use local::LocalStore;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("store error: {0}")]
    Internal(String),
}

/// Blob storage for uploaded files, keyed by `/`-separated paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (create or overwrite) an object.
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Read an object. Returns `StoreError::NotFound` if absent.
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    async fn get_opt(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        match self.get(key).await {
            Ok(data) => Ok(Some(data)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete an object. No-op if absent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List object keys under a prefix, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Delete every object under a prefix and return how many went.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let keys = self.list(prefix).await?;
        for key in &keys {
            self.delete(key).await?;
        }
        Ok(keys.len())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get_opt(key).await?.is_some())
    }
}

// -- Key helpers --

/// Reduce a client-supplied file name to a single safe path segment.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(&['/', '\\'][..]).next().unwrap_or_default().trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "file".to_string(),
        _ => cleaned,
    }
}

pub fn attachment_prefix(owner: &str, attachment_id: &str) -> String {
    format!("attachments/{}/{attachment_id}", sanitize_file_name(owner))
}

pub fn attachment_file_key(owner: &str, attachment_id: &str, file_name: &str) -> String {
    format!(
        "{}/{}",
        attachment_prefix(owner, attachment_id),
        sanitize_file_name(file_name)
    )
}

// -- Configuration --

#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Base directory for stored files. Defaults to `<data dir>/files`.
    pub local_data_dir: Option<String>,
}

impl StoreConfig {
    pub fn local(dir: impl Into<String>) -> Self {
        Self {
            local_data_dir: Some(dir.into()),
        }
    }
}

/// Same lookup order as `anexo_db::data_dir()`, without depending on the
/// db crate.
pub(crate) fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ANEXO_DATA_DIR") {
        return PathBuf::from(dir).join("files");
    }
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("anexo").join("files")
}

pub fn create_store(config: &StoreConfig) -> Arc<dyn ObjectStore> {
    Arc::new(LocalStore::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_keys() {
        assert_eq!(attachment_prefix("ana", "att-1"), "attachments/ana/att-1");
        assert_eq!(
            attachment_file_key("ana", "att-1", "relatorio.pdf"),
            "attachments/ana/att-1/relatorio.pdf"
        );
    }

    #[test]
    fn file_names_are_reduced_to_one_segment() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\ana\\plano.docx"), "plano.docx");
        assert_eq!(sanitize_file_name(".."), "file");
        assert_eq!(sanitize_file_name("   "), "file");
        assert_eq!(sanitize_file_name("a\nb.txt"), "a_b.txt");
        assert_eq!(
            attachment_file_key("../x", "id", "dir/"),
            "attachments/x/id/file"
        );
    }

    #[test]
    fn create_store_uses_configured_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StoreConfig::local(tmp.path().to_string_lossy());
        let _store = create_store(&config);
    }
}
