use std::collections::HashMap;
use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::repo_types::{CacheEntry, CacheStats};
use super::CacheStore;
use crate::background::BackgroundTasks;
use crate::nutrition::{normalize_name, FoodType, NutritionRecord, NutritionSource};

pub const DATABASE_TTL_DAYS: i64 = 30;
pub const AI_FALLBACK_TTL_DAYS: i64 = 7;
/// Portions within this many grams of 100 g share the unsuffixed key.
pub const SERVING_BUCKET_TOLERANCE_GRAMS: f64 = 10.0;
pub const MAX_KEYS_PER_ROUND_TRIP: usize = 100;

pub fn cache_key(name: &str, serving_grams: f64) -> String {
    let base = normalize_name(name).replace(' ', "_");
    if (serving_grams - 100.0).abs() > SERVING_BUCKET_TOLERANCE_GRAMS {
        format!("{base}_{}g", serving_grams.round() as i64)
    } else {
        base
    }
}

pub fn ttl_for(source: NutritionSource) -> Duration {
    match source {
        NutritionSource::AiFallback => Duration::days(AI_FALLBACK_TTL_DAYS),
        _ => Duration::days(DATABASE_TTL_DAYS),
    }
}

/// One pending write for [`NutritionCache::batch_set`].
#[derive(Debug, Clone)]
pub struct CacheWrite {
    pub name: String,
    pub nutrition: NutritionRecord,
    pub source: NutritionSource,
    pub confidence: f64,
    pub serving_grams: f64,
    pub food_type: Option<FoodType>,
}

/// TTL-keyed nutrition cache. Every failure of the backing store is logged
/// and turned into a miss or a dropped write.
#[derive(Clone)]
pub struct NutritionCache {
    store: Arc<dyn CacheStore>,
    background: BackgroundTasks,
}

impl NutritionCache {
    pub fn new(store: Arc<dyn CacheStore>, background: BackgroundTasks) -> Self {
        Self { store, background }
    }

    pub fn background(&self) -> &BackgroundTasks {
        &self.background
    }

    pub async fn get(&self, name: &str, serving_grams: f64) -> Option<CacheEntry> {
        let key = cache_key(name, serving_grams);
        let entry = match self.store.get(&key).await {
            Ok(Some(e)) => e,
            Ok(None) => return None,
            Err(e) => {
                warn!(%key, error = %e, "cache read failed; treating as miss");
                return None;
            }
        };
        self.accept(key, entry, OffsetDateTime::now_utc())
    }

    /// Expired entries are evicted, fresh ones get their hit counter bumped.
    /// Both side effects run detached.
    fn accept(&self, key: String, entry: CacheEntry, now: OffsetDateTime) -> Option<CacheEntry> {
        let store = self.store.clone();
        if entry.is_expired(now) {
            debug!(%key, expired_at = %entry.expires_at, "cache entry expired");
            self.background.spawn("cache_evict", async move {
                store.delete_if_expired(&key, now).await?;
                Ok(())
            });
            return None;
        }
        self.background.spawn("cache_hit_count", async move {
            store.increment_hits(&key).await?;
            Ok(())
        });
        Some(entry)
    }

    pub async fn set(
        &self,
        name: &str,
        nutrition: &NutritionRecord,
        source: NutritionSource,
        confidence: f64,
        serving_grams: f64,
        food_type: Option<FoodType>,
    ) -> bool {
        let write = CacheWrite {
            name: name.to_string(),
            nutrition: nutrition.clone(),
            source,
            confidence,
            serving_grams,
            food_type,
        };
        self.batch_set(vec![write]).await > 0
    }

    /// Looks up many (name, grams) pairs. The map is keyed by the name as
    /// given; chunks that fail are simply missing from it.
    pub async fn batch_get(&self, requests: &[(String, f64)]) -> HashMap<String, CacheEntry> {
        let mut names_by_key: HashMap<String, Vec<String>> = HashMap::new();
        for (name, grams) in requests {
            names_by_key
                .entry(cache_key(name, *grams))
                .or_default()
                .push(name.clone());
        }
        let keys: Vec<String> = names_by_key.keys().cloned().collect();
        let now = OffsetDateTime::now_utc();

        let mut out = HashMap::new();
        for chunk in keys.chunks(MAX_KEYS_PER_ROUND_TRIP) {
            let found = match self.store.get_many(chunk).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(keys = chunk.len(), error = %e, "cache batch read failed for chunk");
                    continue;
                }
            };
            for (key, entry) in found {
                let Some(names) = names_by_key.get(&key) else {
                    continue;
                };
                if let Some(entry) = self.accept(key.clone(), entry, now) {
                    for name in names {
                        out.insert(name.clone(), entry.clone());
                    }
                }
            }
        }
        out
    }

    /// Writes entries in chunks, each chunk committed atomically. Returns the
    /// number of entries persisted; a failed chunk is dropped.
    pub async fn batch_set(&self, writes: Vec<CacheWrite>) -> usize {
        let now = OffsetDateTime::now_utc();
        let docs: Vec<(String, CacheEntry)> = writes
            .into_iter()
            .map(|w| {
                let key = cache_key(&w.name, w.serving_grams);
                let entry = CacheEntry {
                    nutrition: w.nutrition,
                    source: w.source,
                    confidence: w.confidence,
                    serving_grams: w.serving_grams,
                    food_type: w.food_type,
                    cached_at: now,
                    expires_at: now + ttl_for(w.source),
                    hit_count: 0,
                    original_query: w.name,
                };
                (key, entry)
            })
            .collect();

        let mut written = 0;
        for chunk in docs.chunks(MAX_KEYS_PER_ROUND_TRIP) {
            match self.store.put_many(chunk).await {
                Ok(()) => written += chunk.len(),
                Err(e) => warn!(entries = chunk.len(), error = %e, "cache write dropped"),
            }
        }
        written
    }

    pub async fn invalidate(&self, name: &str, serving_grams: f64) -> bool {
        let key = cache_key(name, serving_grams);
        match self.store.delete(&key).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(%key, error = %e, "cache invalidate failed");
                false
            }
        }
    }

    pub async fn cleanup_expired(&self) -> u64 {
        match self.store.delete_expired(OffsetDateTime::now_utc()).await {
            Ok(n) => {
                debug!(removed = n, "expired cache entries removed");
                n
            }
            Err(e) => {
                warn!(error = %e, "cache cleanup failed");
                0
            }
        }
    }

    pub async fn stats(&self) -> Option<CacheStats> {
        match self.store.stats(OffsetDateTime::now_utc()).await {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(error = %e, "cache stats unavailable");
                None
            }
        }
    }
}
