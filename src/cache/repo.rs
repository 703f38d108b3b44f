use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use time::OffsetDateTime;
use tracing::warn;

use super::repo_types::{CacheEntry, CacheRow, CacheStats};
use super::CacheStore;
use crate::error::CacheError;

/// PostgreSQL-backed store: one JSONB document per cache key.
#[derive(Clone)]
pub struct PgCacheStore {
    db: PgPool,
}

impl PgCacheStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { db })
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let row = sqlx::query_as::<_, CacheRow>(
            r#"
            SELECT id, nutrition, source, confidence, serving_grams, food_type,
                   original_query, cached_at, expires_at, hit_count
              FROM nutrition_cache
             WHERE id = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        row.map(CacheEntry::try_from).transpose()
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, CacheEntry>, CacheError> {
        let rows = sqlx::query_as::<_, CacheRow>(
            r#"
            SELECT id, nutrition, source, confidence, serving_grams, food_type,
                   original_query, cached_at, expires_at, hit_count
              FROM nutrition_cache
             WHERE id = ANY($1)
            "#,
        )
        .bind(keys)
        .fetch_all(&self.db)
        .await?;

        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match CacheEntry::try_from(row) {
                Ok(entry) => {
                    out.insert(id, entry);
                }
                Err(e) => warn!(key = %id, error = %e, "skipping malformed cache row"),
            }
        }
        Ok(out)
    }

    async fn put_many(&self, docs: &[(String, CacheEntry)]) -> Result<(), CacheError> {
        let mut tx = self.db.begin().await?;
        for (key, e) in docs {
            sqlx::query(
                r#"
                INSERT INTO nutrition_cache
                    (id, nutrition, source, confidence, serving_grams, food_type,
                     original_query, cached_at, expires_at, hit_count)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (id) DO UPDATE SET
                    nutrition = EXCLUDED.nutrition,
                    source = EXCLUDED.source,
                    confidence = EXCLUDED.confidence,
                    serving_grams = EXCLUDED.serving_grams,
                    food_type = EXCLUDED.food_type,
                    original_query = EXCLUDED.original_query,
                    cached_at = EXCLUDED.cached_at,
                    expires_at = EXCLUDED.expires_at
                "#,
            )
            .bind(key)
            .bind(Json(&e.nutrition))
            .bind(e.source.as_str())
            .bind(e.confidence)
            .bind(e.serving_grams)
            .bind(e.food_type.map(|t| t.as_str()))
            .bind(&e.original_query)
            .bind(e.cached_at)
            .bind(e.expires_at)
            .bind(e.hit_count)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let res = sqlx::query("DELETE FROM nutrition_cache WHERE id = $1")
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_if_expired(&self, key: &str, now: OffsetDateTime) -> Result<bool, CacheError> {
        let res = sqlx::query("DELETE FROM nutrition_cache WHERE id = $1 AND expires_at < $2")
            .bind(key)
            .bind(now)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn increment_hits(&self, key: &str) -> Result<(), CacheError> {
        sqlx::query("UPDATE nutrition_cache SET hit_count = hit_count + 1 WHERE id = $1")
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64, CacheError> {
        let res = sqlx::query("DELETE FROM nutrition_cache WHERE expires_at < $1")
            .bind(now)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }

    async fn stats(&self, now: OffsetDateTime) -> Result<CacheStats, CacheError> {
        let (entries, expired, total_hits): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*)::BIGINT,
                   COUNT(*) FILTER (WHERE expires_at < $1)::BIGINT,
                   COALESCE(SUM(hit_count), 0)::BIGINT
              FROM nutrition_cache
            "#,
        )
        .bind(now)
        .fetch_one(&self.db)
        .await?;
        Ok(CacheStats {
            entries,
            expired,
            total_hits,
        })
    }
}
