use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::error::SourceError;
use crate::nutrition::{NutritionRecord, NutritionSource};

pub mod confidence;
pub mod edamam;
pub mod openfoodfacts;
pub mod usda;

pub use edamam::{EdamamClient, EdamamConfig};
pub use openfoodfacts::{OpenFoodFactsClient, OpenFoodFactsConfig};
pub use usda::{UsdaClient, UsdaConfig};

/// Concurrent calls per source during batch lookups.
pub const BATCH_CONCURRENCY: usize = 3;

/// Best candidate a source found for a query. `nutrition` is expressed for
/// `serving_grams`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMatch {
    pub nutrition: NutritionRecord,
    pub confidence: f64,
    pub serving_grams: f64,
    pub source_id: String,
    pub label: String,
    pub source: NutritionSource,
}

/// One external nutrition database.
#[async_trait]
pub trait FoodSource: Send + Sync {
    fn kind(&self) -> NutritionSource;

    /// `None` covers every failure: the caller moves on to the next source.
    async fn search(&self, query: &str) -> Option<SourceMatch>;

    /// Runs `search` for each distinct query with bounded concurrency.
    async fn batch_search(&self, queries: &[String]) -> HashMap<String, SourceMatch> {
        let mut distinct: Vec<&String> = queries.iter().collect();
        distinct.sort();
        distinct.dedup();
        let lookups: Vec<_> = distinct
            .into_iter()
            .cloned()
            .map(|q| async move { self.search(&q).await.map(|m| (q, m)) })
            .collect();
        stream::iter(lookups)
            .buffer_unordered(BATCH_CONCURRENCY)
            .filter_map(|r| async move { r })
            .collect()
            .await
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

pub(crate) async fn fetch_json<T: DeserializeOwned>(
    source_name: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, SourceError> {
    let response = request
        .send()
        .await
        .map_err(|error| SourceError::Http { source_name, error })?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            source_name,
            status: status.as_u16(),
        });
    }
    response.json::<T>().await.map_err(|e| SourceError::Decode {
        source_name,
        message: e.to_string(),
    })
}

/// Numbers in third-party payloads show up as JSON numbers or strings.
pub(crate) fn json_number(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| x.is_finite())
}
