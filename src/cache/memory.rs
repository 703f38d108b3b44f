use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::repo_types::{CacheEntry, CacheStats};
use super::CacheStore;
use crate::error::CacheError;

/// In-process store, used when no database is configured and in tests.
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    docs: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    /// Raw access for seeding documents directly.
    pub async fn insert_raw(&self, key: &str, entry: CacheEntry) {
        self.docs.write().await.insert(key.to_string(), entry);
    }

    pub async fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.docs.read().await.get(key).cloned()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, CacheEntry>, CacheError> {
        let docs = self.docs.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| docs.get(k).map(|e| (k.clone(), e.clone())))
            .collect())
    }

    async fn put_many(&self, entries: &[(String, CacheEntry)]) -> Result<(), CacheError> {
        let mut docs = self.docs.write().await;
        for (k, e) in entries {
            let hit_count = docs.get(k).map(|old| old.hit_count).unwrap_or(e.hit_count);
            docs.insert(
                k.clone(),
                CacheEntry {
                    hit_count,
                    ..e.clone()
                },
            );
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.docs.write().await.remove(key).is_some())
    }

    async fn delete_if_expired(&self, key: &str, now: OffsetDateTime) -> Result<bool, CacheError> {
        let mut docs = self.docs.write().await;
        if docs.get(key).is_some_and(|e| e.is_expired(now)) {
            docs.remove(key);
            return Ok(true);
        }
        Ok(false)
    }

    async fn increment_hits(&self, key: &str) -> Result<(), CacheError> {
        if let Some(e) = self.docs.write().await.get_mut(key) {
            e.hit_count += 1;
        }
        Ok(())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, CacheError> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|_, e| !e.is_expired(now));
        Ok((before - docs.len()) as u64)
    }

    async fn stats(&self, now: OffsetDateTime) -> Result<CacheStats, CacheError> {
        let docs = self.docs.read().await;
        Ok(CacheStats {
            entries: docs.len() as i64,
            expired: docs.values().filter(|e| e.is_expired(now)).count() as i64,
            total_hits: docs.values().map(|e| e.hit_count).sum(),
        })
    }
}
