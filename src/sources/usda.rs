//! USDA FoodData Central client: the authoritative generic-food database.
//!
//! Search results already carry per-100 g nutrient values, so one request per
//! query is enough. API reference: <https://fdc.nal.usda.gov/api-guide.html>

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::confidence::{match_confidence, ConfidenceProfile};
use super::{fetch_json, http_client, FoodSource, SourceMatch};
use crate::error::SourceError;
use crate::nutrition::{Nutrient, NutritionRecord, NutritionSource};

/// Scale for FoodData Central descriptions.
const PROFILE: ConfidenceProfile = ConfidenceProfile {
    exact: 0.95,
    query_in_label: 0.90,
    label_in_query: 0.88,
    overlap_floor: 0.60,
    overlap_ceiling: 0.85,
};

const SOURCE_NAME: &str = "USDA FoodData Central";
const PAGE_SIZE: u32 = 10;
const DATA_TYPES: &str = "Foundation,SR Legacy,Survey (FNDDS),Branded";

#[derive(Debug, Clone)]
pub struct UsdaConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for UsdaConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.nal.usda.gov/fdc/v1".to_string(),
            timeout_secs: 10,
        }
    }
}

/// FoodData Central nutrient number → record field. Entries sharing a field
/// are summed (omega-3 is ALA + EPA + DPA + DHA).
const NUTRIENT_MAP: &[(u32, Nutrient)] = &[
    (1008, Nutrient::Calories),
    (1003, Nutrient::Protein),
    (1005, Nutrient::Carbs),
    (1004, Nutrient::Fat),
    (1079, Nutrient::Fiber),
    (2000, Nutrient::Sugar),
    (1235, Nutrient::AddedSugar),
    (1258, Nutrient::SaturatedFat),
    (1257, Nutrient::TransFat),
    (1292, Nutrient::MonounsaturatedFat),
    (1293, Nutrient::PolyunsaturatedFat),
    (1404, Nutrient::Omega3),
    (1278, Nutrient::Omega3),
    (1280, Nutrient::Omega3),
    (1272, Nutrient::Omega3),
    (1253, Nutrient::Cholesterol),
    (1093, Nutrient::Sodium),
    (1092, Nutrient::Potassium),
    (1087, Nutrient::Calcium),
    (1089, Nutrient::Iron),
    (1090, Nutrient::Magnesium),
    (1091, Nutrient::Phosphorus),
    (1095, Nutrient::Zinc),
    (1098, Nutrient::Copper),
    (1101, Nutrient::Manganese),
    (1103, Nutrient::Selenium),
    (1106, Nutrient::VitaminA),
    (1162, Nutrient::VitaminC),
    (1114, Nutrient::VitaminD),
    (1109, Nutrient::VitaminE),
    (1185, Nutrient::VitaminK),
    (1165, Nutrient::Thiamin),
    (1166, Nutrient::Riboflavin),
    (1167, Nutrient::Niacin),
    (1175, Nutrient::VitaminB6),
    (1177, Nutrient::Folate),
    (1178, Nutrient::VitaminB12),
    (1051, Nutrient::Water),
];

/// Atwater energy values, used when "Energy" (1008) is missing.
const ATWATER_ENERGY_IDS: [u32; 2] = [2047, 2048];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchFood {
    fdc_id: u64,
    description: String,
    #[serde(default)]
    data_type: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<SearchNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNutrient {
    nutrient_id: Option<u32>,
    value: Option<f64>,
}

pub struct UsdaClient {
    config: UsdaConfig,
    http: reqwest::Client,
}

impl UsdaClient {
    pub fn new(config: UsdaConfig) -> Self {
        let http = http_client(config.timeout_secs);
        Self { config, http }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn search_foods(&self, query: &str) -> Result<Vec<SearchFood>, SourceError> {
        if !self.is_enabled() {
            return Err(SourceError::Disabled(SOURCE_NAME));
        }
        let url = format!("{}/foods/search", self.config.base_url);
        let request = self.http.get(&url).query(&[
            ("api_key", self.config.api_key.as_str()),
            ("query", query),
            ("pageSize", &PAGE_SIZE.to_string()),
            ("dataType", DATA_TYPES),
        ]);
        let body: SearchResponse = fetch_json(SOURCE_NAME, request).await?;
        Ok(body.foods)
    }
}

/// Bonus for the more authoritative FoodData Central datasets.
fn data_type_bonus(data_type: Option<&str>) -> f64 {
    match data_type {
        Some("Foundation") => 0.10,
        Some("SR Legacy") => 0.08,
        Some("Survey (FNDDS)") => 0.05,
        _ => 0.0,
    }
}

fn map_nutrients(nutrients: &[SearchNutrient]) -> NutritionRecord {
    let mut record = NutritionRecord::default();
    let mut atwater = None;
    for n in nutrients {
        let (Some(id), Some(value)) = (n.nutrient_id, n.value) else {
            continue;
        };
        if ATWATER_ENERGY_IDS.contains(&id) {
            atwater.get_or_insert(value);
            continue;
        }
        if let Some((_, field)) = NUTRIENT_MAP.iter().find(|(nid, _)| *nid == id) {
            *record.get_mut(*field) += value;
        }
    }
    if record.calories == 0.0 {
        if let Some(kcal) = atwater {
            record.calories = kcal;
        }
    }
    record.rounded()
}

fn best_match(query: &str, foods: Vec<SearchFood>) -> Option<SourceMatch> {
    foods
        .into_iter()
        .map(|f| {
            let confidence = match_confidence(
                query,
                &f.description,
                &PROFILE,
                data_type_bonus(f.data_type.as_deref()),
            );
            (confidence, f)
        })
        .filter(|(c, f)| *c > 0.0 && !f.food_nutrients.is_empty())
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(confidence, f)| SourceMatch {
            nutrition: map_nutrients(&f.food_nutrients),
            confidence,
            serving_grams: 100.0,
            source_id: f.fdc_id.to_string(),
            label: f.description,
            source: NutritionSource::Usda,
        })
}

#[async_trait]
impl FoodSource for UsdaClient {
    fn kind(&self) -> NutritionSource {
        NutritionSource::Usda
    }

    async fn search(&self, query: &str) -> Option<SourceMatch> {
        match self.search_foods(query).await {
            Ok(foods) if foods.is_empty() => {
                debug!(%query, "usda: no results");
                None
            }
            Ok(foods) => best_match(query, foods),
            Err(SourceError::Disabled(_)) => None,
            Err(e) => {
                warn!(%query, error = %e, "usda search failed");
                None
            }
        }
    }
}
