//! Open Food Facts client: barcode/label database, strongest on packaged
//! products. Nutriments are reported per 100 g with mass values in grams.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::confidence::{match_confidence, ConfidenceProfile};
use super::{fetch_json, http_client, json_number, FoodSource, SourceMatch};
use crate::error::SourceError;
use crate::nutrition::{Nutrient, NutritionRecord, NutritionSource};

/// A bare brand name inside a longer query says little about the product.
const PROFILE: ConfidenceProfile = ConfidenceProfile {
    exact: 0.95,
    query_in_label: 0.90,
    label_in_query: 0.85,
    overlap_floor: 0.60,
    overlap_ceiling: 0.82,
};

const SOURCE_NAME: &str = "Open Food Facts";
const PAGE_SIZE: u32 = 10;
const KJ_PER_KCAL: f64 = 4.184;
const COMPLETE_PANEL_BONUS: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct OpenFoodFactsConfig {
    /// Open Food Facts identifies API consumers by user agent instead of a key.
    pub user_agent: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OpenFoodFactsConfig {
    fn default() -> Self {
        Self {
            user_agent: String::new(),
            base_url: "https://world.openfoodfacts.org".to_string(),
            timeout_secs: 10,
        }
    }
}

const G: f64 = 1.0;
const MG: f64 = 1_000.0;
const UG: f64 = 1_000_000.0;

/// `<key>_100g` nutriment → field, with the factor from grams to the
/// record's unit.
const NUTRIMENT_MAP: &[(&str, Nutrient, f64)] = &[
    ("energy-kcal", Nutrient::Calories, 1.0),
    ("proteins", Nutrient::Protein, G),
    ("carbohydrates", Nutrient::Carbs, G),
    ("fat", Nutrient::Fat, G),
    ("fiber", Nutrient::Fiber, G),
    ("sugars", Nutrient::Sugar, G),
    ("added-sugars", Nutrient::AddedSugar, G),
    ("saturated-fat", Nutrient::SaturatedFat, G),
    ("trans-fat", Nutrient::TransFat, G),
    ("monounsaturated-fat", Nutrient::MonounsaturatedFat, G),
    ("polyunsaturated-fat", Nutrient::PolyunsaturatedFat, G),
    ("omega-3-fat", Nutrient::Omega3, G),
    ("cholesterol", Nutrient::Cholesterol, MG),
    ("sodium", Nutrient::Sodium, MG),
    ("potassium", Nutrient::Potassium, MG),
    ("calcium", Nutrient::Calcium, MG),
    ("iron", Nutrient::Iron, MG),
    ("magnesium", Nutrient::Magnesium, MG),
    ("phosphorus", Nutrient::Phosphorus, MG),
    ("zinc", Nutrient::Zinc, MG),
    ("copper", Nutrient::Copper, MG),
    ("manganese", Nutrient::Manganese, MG),
    ("selenium", Nutrient::Selenium, UG),
    ("vitamin-a", Nutrient::VitaminA, UG),
    ("vitamin-c", Nutrient::VitaminC, MG),
    ("vitamin-d", Nutrient::VitaminD, UG),
    ("vitamin-e", Nutrient::VitaminE, MG),
    ("vitamin-k", Nutrient::VitaminK, UG),
    ("vitamin-b1", Nutrient::Thiamin, MG),
    ("vitamin-b2", Nutrient::Riboflavin, MG),
    ("vitamin-pp", Nutrient::Niacin, MG),
    ("vitamin-b6", Nutrient::VitaminB6, MG),
    ("vitamin-b9", Nutrient::Folate, UG),
    ("vitamin-b12", Nutrient::VitaminB12, UG),
];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    nutriments: HashMap<String, serde_json::Value>,
}

impl Product {
    fn label(&self) -> Option<String> {
        let name = self.product_name.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        match self.brands.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            // several brands come comma separated; the first is the owner
            Some(brands) => {
                let brand = brands.split(',').next().unwrap_or(brands).trim();
                Some(format!("{brand} {name}"))
            }
            None => Some(name.to_string()),
        }
    }

    fn per_100g(&self, key: &str) -> Option<f64> {
        self.nutriments.get(&format!("{key}_100g")).and_then(json_number)
    }

    fn has_complete_panel(&self) -> bool {
        let energy = self.per_100g("energy-kcal").or_else(|| self.per_100g("energy"));
        energy.is_some()
            && ["proteins", "carbohydrates", "fat"]
                .iter()
                .all(|k| self.per_100g(k).is_some())
    }
}

pub struct OpenFoodFactsClient {
    config: OpenFoodFactsConfig,
    http: reqwest::Client,
}

impl OpenFoodFactsClient {
    pub fn new(config: OpenFoodFactsConfig) -> Self {
        let http = http_client(config.timeout_secs);
        Self { config, http }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.user_agent.is_empty()
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, SourceError> {
        if !self.is_enabled() {
            return Err(SourceError::Disabled(SOURCE_NAME));
        }
        let url = format!("{}/cgi/search.pl", self.config.base_url);
        let request = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("page_size", &PAGE_SIZE.to_string()),
            ]);
        let body: SearchResponse = fetch_json(SOURCE_NAME, request).await?;
        Ok(body.products)
    }
}

fn map_nutriments(p: &Product) -> NutritionRecord {
    let mut record = NutritionRecord::default();
    for (key, field, factor) in NUTRIMENT_MAP {
        if let Some(v) = p.per_100g(key) {
            record.set(*field, v * factor);
        }
    }
    if record.calories == 0.0 {
        if let Some(kj) = p.per_100g("energy") {
            record.calories = kj / KJ_PER_KCAL;
        }
    }
    if record.sodium == 0.0 {
        // salt is 40% sodium by mass
        if let Some(salt) = p.per_100g("salt") {
            record.sodium = salt * 0.4 * MG;
        }
    }
    record.rounded()
}

fn best_match(query: &str, products: Vec<Product>) -> Option<SourceMatch> {
    products
        .into_iter()
        .filter_map(|p| {
            let label = p.label()?;
            let bonus = if p.has_complete_panel() {
                COMPLETE_PANEL_BONUS
            } else {
                0.0
            };
            let confidence = match_confidence(query, &label, &PROFILE, bonus);
            (confidence > 0.0 && !p.nutriments.is_empty()).then_some((confidence, label, p))
        })
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(confidence, label, p)| SourceMatch {
            nutrition: map_nutriments(&p),
            confidence,
            serving_grams: 100.0,
            source_id: p.code.unwrap_or_default(),
            label,
            source: NutritionSource::OpenFoodFacts,
        })
}

#[async_trait]
impl FoodSource for OpenFoodFactsClient {
    fn kind(&self) -> NutritionSource {
        NutritionSource::OpenFoodFacts
    }

    async fn search(&self, query: &str) -> Option<SourceMatch> {
        match self.search_products(query).await {
            Ok(products) if products.is_empty() => {
                debug!(%query, "openfoodfacts: no results");
                None
            }
            Ok(products) => best_match(query, products),
            Err(SourceError::Disabled(_)) => None,
            Err(e) => {
                warn!(%query, error = %e, "openfoodfacts search failed");
                None
            }
        }
    }
}
