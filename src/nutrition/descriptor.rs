use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::record::NutritionRecord;

/// Serving size used when a descriptor carries no usable weight.
pub const DEFAULT_SERVING_GRAMS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodType {
    WholeFood,
    BrandedPackaged,
    RestaurantItem,
    HomemadeDish,
    GenericDish,
}

impl FoodType {
    pub fn as_str(self) -> &'static str {
        match self {
            FoodType::WholeFood => "whole_food",
            FoodType::BrandedPackaged => "branded_packaged",
            FoodType::RestaurantItem => "restaurant_item",
            FoodType::HomemadeDish => "homemade_dish",
            FoodType::GenericDish => "generic_dish",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "whole_food" => Some(FoodType::WholeFood),
            "branded_packaged" => Some(FoodType::BrandedPackaged),
            "restaurant_item" => Some(FoodType::RestaurantItem),
            "homemade_dish" => Some(FoodType::HomemadeDish),
            "generic_dish" => Some(FoodType::GenericDish),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientPortion {
    pub name: String,
    pub grams: f64,
}

/// An identified food mention, as produced by the identification layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodDescriptor {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    pub estimated_grams: f64,
    #[serde(default)]
    pub food_type: Option<FoodType>,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientPortion>,
    #[serde(default)]
    pub food_group: Option<String>,
    #[serde(default)]
    pub is_beverage: Option<bool>,
}

impl FoodDescriptor {
    pub fn new(name: impl Into<String>, estimated_grams: f64, food_type: FoodType) -> Self {
        Self {
            name: name.into(),
            quantity: None,
            unit: None,
            estimated_grams,
            food_type: Some(food_type),
            restaurant_name: None,
            brand_name: None,
            ingredients: Vec::new(),
            food_group: None,
            is_beverage: None,
        }
    }

    pub fn food_type(&self) -> FoodType {
        self.food_type.unwrap_or(FoodType::GenericDish)
    }

    pub fn serving_grams(&self) -> f64 {
        if self.estimated_grams.is_finite() && self.estimated_grams > 0.0 {
            self.estimated_grams
        } else {
            DEFAULT_SERVING_GRAMS
        }
    }

    /// Checks the boundary contract: a name and a positive weight.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is required".into());
        }
        if !(self.estimated_grams.is_finite() && self.estimated_grams > 0.0) {
            return Err(format!(
                "estimated_grams must be positive for '{}'",
                self.name
            ));
        }
        if let Some(bad) = self.ingredients.iter().find(|i| !(i.grams > 0.0)) {
            return Err(format!("ingredient '{}' must have positive grams", bad.name));
        }
        Ok(())
    }
}

/// Where a resolved nutrition record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutritionSource {
    Cache,
    Usda,
    #[serde(rename = "openfoodfacts")]
    OpenFoodFacts,
    Edamam,
    Hybrid,
    Decomposed,
    AiFallback,
    /// Nothing matched.
    None,
}

impl NutritionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            NutritionSource::Cache => "cache",
            NutritionSource::Usda => "usda",
            NutritionSource::OpenFoodFacts => "openfoodfacts",
            NutritionSource::Edamam => "edamam",
            NutritionSource::Hybrid => "hybrid",
            NutritionSource::Decomposed => "decomposed",
            NutritionSource::AiFallback => "ai_fallback",
            NutritionSource::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cache" => Some(NutritionSource::Cache),
            "usda" => Some(NutritionSource::Usda),
            "openfoodfacts" => Some(NutritionSource::OpenFoodFacts),
            "edamam" => Some(NutritionSource::Edamam),
            "hybrid" => Some(NutritionSource::Hybrid),
            "decomposed" => Some(NutritionSource::Decomposed),
            "ai_fallback" => Some(NutritionSource::AiFallback),
            "none" => Some(NutritionSource::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub nutrition: NutritionRecord,
    pub source: NutritionSource,
    pub confidence: f64,
    pub serving_grams: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ResolutionResult {
    /// Terminal state when every applicable source and the cache missed.
    pub fn unresolved(serving_grams: f64) -> Self {
        Self {
            nutrition: NutritionRecord::default(),
            source: NutritionSource::None,
            confidence: 0.0,
            serving_grams,
            label: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.confidence > 0.0
    }
}

lazy_static! {
    static ref APOSTROPHE_RE: Regex = Regex::new(r"['’`]").unwrap();
    static ref PUNCTUATION_RE: Regex = Regex::new(r"[^\p{L}\p{N}\s]").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Lowercase, trim, strip punctuation and collapse whitespace. Apostrophes
/// vanish so "Jerry's" and "Jerrys" agree; other punctuation separates words.
pub fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let joined = APOSTROPHE_RE.replace_all(&lower, "");
    let stripped = PUNCTUATION_RE.replace_all(&joined, " ");
    WHITESPACE_RE.replace_all(stripped.trim(), " ").into_owned()
}

pub fn name_words(name: &str) -> Vec<String> {
    normalize_name(name)
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}
