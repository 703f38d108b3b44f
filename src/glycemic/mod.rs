mod engine;
pub mod table;

pub use engine::{
    glycemic_load, is_relevant, Band, GiResult, GlycemicEngine, MatchType, MealGlycemic,
    FUZZY_MATCH_THRESHOLD, MIN_RELEVANT_CARBS,
};
pub use table::{EntryQuality, GiCategory, GiEntry};
