use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::CacheError;

mod memory;
mod repo;
pub mod repo_types;
pub mod services;

pub use memory::MemoryCacheStore;
pub use repo::PgCacheStore;
pub use repo_types::{CacheEntry, CacheStats};
pub use services::{cache_key, ttl_for, CacheWrite, NutritionCache};

/// Document store behind the nutrition cache. Keys are already normalized.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;
    /// Single round-trip lookup; callers keep `keys` at or under 100.
    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, CacheEntry>, CacheError>;
    /// All-or-nothing upsert.
    async fn put_many(&self, docs: &[(String, CacheEntry)]) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
    /// Deletes `key` only while its stored document is still expired at
    /// `now`, so a concurrent refresh survives the eviction.
    async fn delete_if_expired(&self, key: &str, now: OffsetDateTime) -> Result<bool, CacheError>;
    async fn increment_hits(&self, key: &str) -> Result<(), CacheError>;
    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, CacheError>;
    async fn stats(&self, now: OffsetDateTime) -> Result<CacheStats, CacheError>;
}
