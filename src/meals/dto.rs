use serde::{Deserialize, Serialize};

use crate::glycemic::GiResult;
use crate::nutrition::{FoodDescriptor, NutritionRecord};

#[derive(Debug, Deserialize)]
pub struct AnalyzeMealRequest {
    pub items: Vec<FoodDescriptor>,
}

#[derive(Debug, Deserialize)]
pub struct GlycemicRequest {
    pub name: String,
    pub nutrition: NutritionRecord,
    pub serving_grams: f64,
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub nutrition: NutritionRecord,
    pub serving_grams: f64,
    #[serde(default)]
    pub food_group: Option<String>,
    #[serde(default)]
    pub is_beverage: Option<bool>,
    #[serde(default)]
    pub gi: Option<GiResult>,
}

#[derive(Debug, Deserialize)]
pub struct InvalidateCacheRequest {
    pub name: String,
    pub serving_grams: f64,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub removed: u64,
}

pub(crate) fn positive_grams(grams: f64) -> Result<(), String> {
    if grams.is_finite() && grams > 0.0 {
        Ok(())
    } else {
        Err("serving_grams must be positive".into())
    }
}

pub(crate) fn required_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        Err("name is required".into())
    } else {
        Ok(())
    }
}
