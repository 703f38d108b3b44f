use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::services::AnalyzedItem;
use crate::grading::Grade;

/// Produces a short natural-language note for an analyzed item. Purely
/// additive: the pipeline drops the note when this fails.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn generate(&self, item: &AnalyzedItem) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
struct InsightRequest<'a> {
    name: &'a str,
    serving_grams: f64,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    fiber: f64,
    overall_grade: Grade,
    #[serde(skip_serializing_if = "Option::is_none")]
    glycemic_index: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct InsightResponse {
    insight: String,
}

/// Posts a compact item summary to an external insight service.
pub struct RemoteInsightGenerator {
    url: String,
    http: reqwest::Client,
}

impl RemoteInsightGenerator {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            url: url.into(),
            http,
        }
    }
}

#[async_trait]
impl InsightGenerator for RemoteInsightGenerator {
    async fn generate(&self, item: &AnalyzedItem) -> anyhow::Result<String> {
        let n = &item.nutrition;
        let body = InsightRequest {
            name: &item.name,
            serving_grams: item.serving_grams,
            calories: n.calories,
            protein: n.protein,
            carbs: n.carbs,
            fat: n.fat,
            fiber: n.fiber,
            overall_grade: item.grading.overall.grade,
            glycemic_index: n.glycemic_index,
        };
        let res = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: InsightResponse = res.json().await?;
        let text = parsed.insight.trim();
        anyhow::ensure!(!text.is_empty(), "insight service returned an empty insight");
        Ok(text.to_string())
    }
}
