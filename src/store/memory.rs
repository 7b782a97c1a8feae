//! In-memory [`CacheStore`] implementation for testing.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::CacheStore;

/// In-memory store that also counts writes.
#[derive(Default)]
pub struct MemoryStore {
    contents: RwLock<Option<String>>,
    writes: RwLock<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `contents`.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: RwLock::new(Some(contents.into())),
            writes: RwLock::new(0),
        }
    }

    /// Snapshot of the current contents.
    pub fn contents(&self) -> Option<String> {
        self.contents.read().ok().and_then(|c| c.clone())
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.read().map(|w| *w).unwrap_or(0)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn read(&self) -> Result<Option<String>> {
        let guard = self
            .contents
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(guard.clone())
    }

    async fn write(&self, contents: &str) -> Result<()> {
        {
            let mut guard = self
                .contents
                .write()
                .map_err(|_| anyhow!("memory store lock poisoned"))?;
            *guard = Some(contents.to_string());
        }
        let mut writes = self
            .writes
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        *writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_empty_and_counts_writes() {
        let store = MemoryStore::new();
        assert_eq!(store.read().await.unwrap(), None);
        store.write("a").await.unwrap();
        store.write("b").await.unwrap();
        assert_eq!(store.read().await.unwrap().as_deref(), Some("b"));
        assert_eq!(store.write_count(), 2);
    }
}
