mod descriptor;
mod record;
pub mod rounding;

pub use descriptor::{
    name_words, normalize_name, FoodDescriptor, FoodType, IngredientPortion, NutritionSource,
    ResolutionResult, DEFAULT_SERVING_GRAMS,
};
pub use record::{Nutrient, NutritionRecord};
