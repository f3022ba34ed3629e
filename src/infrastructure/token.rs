//! Durable bearer-token persistence behind a small trait, so the session
//! logic is identical whether the token lives in a file (the CLI shell) or
//! in memory (tests).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::constants::TOKEN_STORAGE_KEY;
use crate::core::errors::{LibraryError, LibraryResult};

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> LibraryResult<Option<String>>;
    async fn save(&self, token: &str) -> LibraryResult<()>;
    async fn clear(&self) -> LibraryResult<()>;
}

#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        InMemoryTokenStore {
            token: Arc::new(RwLock::new(Some(token.to_string()))),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self) -> LibraryResult<Option<String>> {
        Ok(self.token.read().await.clone())
    }

    async fn save(&self, token: &str) -> LibraryResult<()> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> LibraryResult<()> {
        *self.token.write().await = None;
        Ok(())
    }
}

/// Key-value file store; the token lives under the `token` key of a small
/// JSON object so the file can carry other session state later.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileTokenStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_map(&self) -> LibraryResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| LibraryError::Storage(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| LibraryError::Storage(e.to_string()))
    }

    fn write_map(&self, map: &HashMap<String, String>) -> LibraryResult<()> {
        let raw = serde_json::to_string_pretty(map).map_err(|e| LibraryError::Storage(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| LibraryError::Storage(e.to_string()))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> LibraryResult<Option<String>> {
        Ok(self.read_map()?.remove(TOKEN_STORAGE_KEY))
    }

    async fn save(&self, token: &str) -> LibraryResult<()> {
        let mut map = self.read_map()?;
        map.insert(TOKEN_STORAGE_KEY.to_string(), token.to_string());
        self.write_map(&map)
    }

    async fn clear(&self) -> LibraryResult<()> {
        let mut map = self.read_map()?;
        if map.remove(TOKEN_STORAGE_KEY).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}
