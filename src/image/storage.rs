//! Local key/value storage primitive backing the persistent image cache.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;

/// String storage addressed by key, the only persistence the image cache needs.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;
}

// == File Storage ==
/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates the storage, creating `root` if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{}.json", name))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

// == Memory Storage ==
/// In-process storage, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_storage_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path().join("nested")).unwrap();

        assert_eq!(storage.get_item("@app/images").await.unwrap(), None);

        storage.set_item("@app/images", "{\"a\":1}").await.unwrap();
        assert_eq!(
            storage.get_item("@app/images").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        storage.set_item("@app/images", "{}").await.unwrap();
        assert_eq!(storage.get_item("@app/images").await.unwrap().as_deref(), Some("{}"));

        storage.remove_item("@app/images").await.unwrap();
        assert_eq!(storage.get_item("@app/images").await.unwrap(), None);
        storage.remove_item("@app/images").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_storage_keys_do_not_collide_with_paths() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path()).unwrap();

        storage.set_item("../escape", "x").await.unwrap();
        assert!(storage.path_for("../escape").starts_with(tmp.path()));
        assert_eq!(storage.get_item("../escape").await.unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "v").await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("v"));
        storage.remove_item("k").await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap(), None);
    }
}
