use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;

use crate::error::CacheError;
use crate::nutrition::{FoodType, NutritionRecord, NutritionSource};

/// A persisted resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub nutrition: NutritionRecord,
    pub source: NutritionSource,
    pub confidence: f64,
    pub serving_grams: f64,
    pub food_type: Option<FoodType>,
    #[serde(with = "time::serde::rfc3339")]
    pub cached_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub hit_count: i64,
    pub original_query: String,
}

impl CacheEntry {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

/// Row shape of the `nutrition_cache` table.
#[derive(Debug, Clone, FromRow)]
pub struct CacheRow {
    pub id: String,
    pub nutrition: Json<NutritionRecord>,
    pub source: String,
    pub confidence: f64,
    pub serving_grams: f64,
    pub food_type: Option<String>,
    pub original_query: String,
    pub cached_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub hit_count: i64,
}

impl TryFrom<CacheRow> for CacheEntry {
    type Error = CacheError;

    fn try_from(r: CacheRow) -> Result<Self, Self::Error> {
        let source = NutritionSource::parse(&r.source)
            .ok_or_else(|| CacheError::Malformed(format!("{}: unknown source {}", r.id, r.source)))?;
        Ok(Self {
            nutrition: r.nutrition.0,
            source,
            confidence: r.confidence,
            serving_grams: r.serving_grams,
            food_type: r.food_type.as_deref().and_then(FoodType::parse),
            cached_at: r.cached_at,
            expires_at: r.expires_at,
            hit_count: r.hit_count,
            original_query: r.original_query,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: i64,
    pub expired: i64,
    pub total_hits: i64,
}
