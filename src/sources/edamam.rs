//! Edamam Food Database client: broad commercial coverage including
//! restaurant and fast-food items.
//!
//! The parser endpoint only reports five macros per hint, so the best hint is
//! followed by a nutrients request for the full panel at 100 g.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::confidence::{match_confidence, ConfidenceProfile};
use super::{fetch_json, http_client, FoodSource, SourceMatch};
use crate::error::SourceError;
use crate::nutrition::{Nutrient, NutritionRecord, NutritionSource};

/// The parser matches loosely, so partial word overlap counts for less.
const PROFILE: ConfidenceProfile = ConfidenceProfile {
    exact: 0.95,
    query_in_label: 0.90,
    label_in_query: 0.88,
    overlap_floor: 0.60,
    overlap_ceiling: 0.80,
};

const SOURCE_NAME: &str = "Edamam";
const GRAM_MEASURE_URI: &str = "http://www.edamam.com/ontologies/edamam.owl#Measure_gram";

#[derive(Debug, Clone)]
pub struct EdamamConfig {
    pub app_id: String,
    pub app_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EdamamConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_key: String::new(),
            base_url: "https://api.edamam.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Edamam nutrient code → field. Units already match the record.
const NUTRIENT_MAP: &[(&str, Nutrient)] = &[
    ("ENERC_KCAL", Nutrient::Calories),
    ("PROCNT", Nutrient::Protein),
    ("CHOCDF", Nutrient::Carbs),
    ("FAT", Nutrient::Fat),
    ("FIBTG", Nutrient::Fiber),
    ("SUGAR", Nutrient::Sugar),
    ("SUGAR.added", Nutrient::AddedSugar),
    ("FASAT", Nutrient::SaturatedFat),
    ("FATRN", Nutrient::TransFat),
    ("FAMS", Nutrient::MonounsaturatedFat),
    ("FAPU", Nutrient::PolyunsaturatedFat),
    ("CHOLE", Nutrient::Cholesterol),
    ("NA", Nutrient::Sodium),
    ("K", Nutrient::Potassium),
    ("CA", Nutrient::Calcium),
    ("FE", Nutrient::Iron),
    ("MG", Nutrient::Magnesium),
    ("P", Nutrient::Phosphorus),
    ("ZN", Nutrient::Zinc),
    ("VITA_RAE", Nutrient::VitaminA),
    ("VITC", Nutrient::VitaminC),
    ("VITD", Nutrient::VitaminD),
    ("TOCPHA", Nutrient::VitaminE),
    ("VITK1", Nutrient::VitaminK),
    ("THIA", Nutrient::Thiamin),
    ("RIBF", Nutrient::Riboflavin),
    ("NIA", Nutrient::Niacin),
    ("VITB6A", Nutrient::VitaminB6),
    ("FOLDFE", Nutrient::Folate),
    ("VITB12", Nutrient::VitaminB12),
    ("WATER", Nutrient::Water),
];

#[derive(Debug, Deserialize)]
struct ParserResponse {
    #[serde(default)]
    hints: Vec<Hint>,
}

#[derive(Debug, Deserialize)]
struct Hint {
    food: HintFood,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HintFood {
    food_id: String,
    label: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    nutrients: HashMap<String, f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NutrientsRequest<'a> {
    ingredients: Vec<NutrientsIngredient<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NutrientsIngredient<'a> {
    quantity: f64,
    #[serde(rename = "measureURI")]
    measure_uri: &'a str,
    food_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NutrientsResponse {
    #[serde(default)]
    total_nutrients: HashMap<String, NutrientAmount>,
}

#[derive(Debug, Deserialize)]
struct NutrientAmount {
    quantity: f64,
}

pub struct EdamamClient {
    config: EdamamConfig,
    http: reqwest::Client,
}

impl EdamamClient {
    pub fn new(config: EdamamConfig) -> Self {
        let http = http_client(config.timeout_secs);
        Self { config, http }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.app_id.is_empty() && !self.config.app_key.is_empty()
    }

    async fn parse(&self, query: &str) -> Result<Vec<Hint>, SourceError> {
        if !self.is_enabled() {
            return Err(SourceError::Disabled(SOURCE_NAME));
        }
        let url = format!("{}/api/food-database/v2/parser", self.config.base_url);
        let request = self.http.get(&url).query(&[
            ("app_id", self.config.app_id.as_str()),
            ("app_key", self.config.app_key.as_str()),
            ("ingr", query),
            ("nutrition-type", "logging"),
        ]);
        let body: ParserResponse = fetch_json(SOURCE_NAME, request).await?;
        Ok(body.hints)
    }

    async fn full_panel(&self, food_id: &str) -> Result<NutritionRecord, SourceError> {
        let url = format!("{}/api/food-database/v2/nutrients", self.config.base_url);
        let body = NutrientsRequest {
            ingredients: vec![NutrientsIngredient {
                quantity: 100.0,
                measure_uri: GRAM_MEASURE_URI,
                food_id,
            }],
        };
        let request = self
            .http
            .post(&url)
            .query(&[
                ("app_id", self.config.app_id.as_str()),
                ("app_key", self.config.app_key.as_str()),
            ])
            .json(&body);
        let res: NutrientsResponse = fetch_json(SOURCE_NAME, request).await?;
        let amounts: HashMap<String, f64> = res
            .total_nutrients
            .into_iter()
            .map(|(k, v)| (k, v.quantity))
            .collect();
        Ok(map_nutrients(&amounts))
    }
}

fn category_bonus(category: Option<&str>) -> f64 {
    match category {
        Some("Generic foods") => 0.10,
        Some("Generic meals") | Some("Fast foods") => 0.05,
        _ => 0.0,
    }
}

fn map_nutrients(amounts: &HashMap<String, f64>) -> NutritionRecord {
    let mut record = NutritionRecord::default();
    for (code, field) in NUTRIENT_MAP {
        if let Some(v) = amounts.get(*code) {
            record.set(*field, *v);
        }
    }
    record.rounded()
}

fn hint_label(food: &HintFood) -> String {
    match food.brand.as_deref().filter(|b| !b.is_empty()) {
        Some(brand) if !food.label.to_lowercase().contains(&brand.to_lowercase()) => {
            format!("{brand} {}", food.label)
        }
        _ => food.label.clone(),
    }
}

fn best_hint(query: &str, hints: Vec<Hint>) -> Option<(f64, String, HintFood)> {
    hints
        .into_iter()
        .map(|h| {
            let label = hint_label(&h.food);
            let confidence = match_confidence(
                query,
                &label,
                &PROFILE,
                category_bonus(h.food.category.as_deref()),
            );
            (confidence, label, h.food)
        })
        .filter(|(c, _, _)| *c > 0.0)
        .max_by(|a, b| a.0.total_cmp(&b.0))
}

#[async_trait]
impl FoodSource for EdamamClient {
    fn kind(&self) -> NutritionSource {
        NutritionSource::Edamam
    }

    async fn search(&self, query: &str) -> Option<SourceMatch> {
        let hints = match self.parse(query).await {
            Ok(hints) => hints,
            Err(SourceError::Disabled(_)) => return None,
            Err(e) => {
                warn!(%query, error = %e, "edamam parser failed");
                return None;
            }
        };
        let Some((confidence, label, food)) = best_hint(query, hints) else {
            debug!(%query, "edamam: no usable hints");
            return None;
        };

        let nutrition = match self.full_panel(&food.food_id).await {
            Ok(n) if n.calories > 0.0 || food.nutrients.is_empty() => n,
            Ok(_) => map_nutrients(&food.nutrients),
            Err(e) => {
                warn!(food_id = %food.food_id, error = %e, "edamam nutrients failed; using parser macros");
                map_nutrients(&food.nutrients)
            }
        };

        Some(SourceMatch {
            nutrition,
            confidence,
            serving_grams: 100.0,
            source_id: food.food_id,
            label,
            source: NutritionSource::Edamam,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> Vec<Hint> {
        let body: ParserResponse = serde_json::from_value(serde_json::json!({
            "hints": [
                {
                    "food": {
                        "foodId": "food_b1",
                        "label": "Burrito, Chicken",
                        "brand": "Chipotle",
                        "category": "Fast foods",
                        "nutrients": { "ENERC_KCAL": 180.2, "PROCNT": 9.5, "FAT": 6.1, "CHOCDF": 21.0, "FIBTG": 2.4 }
                    }
                },
                {
                    "food": {
                        "foodId": "food_b2",
                        "label": "Chicken Burrito",
                        "category": "Generic meals",
                        "nutrients": { "ENERC_KCAL": 200.0 }
                    }
                }
            ]
        }))
        .unwrap();
        body.hints
    }

    #[test]
    fn branded_fast_food_hint_wins_for_restaurant_query() {
        let (confidence, label, food) = best_hint("Chipotle burrito", hints()).unwrap();
        assert_eq!(food.food_id, "food_b1");
        assert_eq!(label, "Chipotle Burrito, Chicken");
        assert!((confidence - 0.95).abs() < 1e-9, "{confidence}");

        let (_, _, generic) = best_hint("chicken burrito", hints()).unwrap();
        assert_eq!(generic.food_id, "food_b2");
    }

    #[test]
    fn parser_macros_map_with_rounding() {
        let (_, _, food) = best_hint("Chipotle burrito", hints()).unwrap();
        let r = map_nutrients(&food.nutrients);
        assert_eq!(r.calories, 180.0);
        assert_eq!(r.protein, 9.5);
        assert_eq!(r.fiber, 2.4);
        assert_eq!(r.sugar, 0.0);
    }

    #[test]
    fn nutrients_request_uses_gram_measure() {
        let body = NutrientsRequest {
            ingredients: vec![NutrientsIngredient {
                quantity: 100.0,
                measure_uri: GRAM_MEASURE_URI,
                food_id: "food_b1",
            }],
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["ingredients"][0]["measureURI"], GRAM_MEASURE_URI);
        assert_eq!(v["ingredients"][0]["foodId"], "food_b1");
    }

    #[tokio::test]
    async fn disabled_without_credentials() {
        let client = EdamamClient::new(EdamamConfig {
            app_id: "id".into(),
            ..Default::default()
        });
        assert!(!client.is_enabled());
        assert!(client.search("burrito").await.is_none());
    }
}
