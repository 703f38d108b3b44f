use serde::{Deserialize, Serialize};
use tracing::debug;

use super::table::{EntryQuality, GiCategory, GiEntry, CATEGORY_KEYWORDS, REFERENCE_TABLE};
use crate::nutrition::{name_words, normalize_name, NutritionRecord};

/// Minimum word-overlap score for a fuzzy match. Kept as found; pending review.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.5;
/// Below this many grams of carbohydrate GI is not meaningful.
pub const MIN_RELEVANT_CARBS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Low,
    Medium,
    High,
}

impl Band {
    pub fn for_gi(gi: f64) -> Self {
        if gi <= 55.0 {
            Band::Low
        } else if gi <= 69.0 {
            Band::Medium
        } else {
            Band::High
        }
    }

    pub fn for_gl(gl: f64) -> Self {
        if gl <= 10.0 {
            Band::Low
        } else if gl <= 19.0 {
            Band::Medium
        } else {
            Band::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Fuzzy,
    Category,
    Default,
}

impl MatchType {
    pub fn multiplier(self) -> f64 {
        match self {
            MatchType::Exact => 1.0,
            MatchType::Fuzzy => 0.85,
            MatchType::Category => 0.60,
            MatchType::Default => 0.40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiResult {
    pub glycemic_index: f64,
    pub glycemic_load: f64,
    pub gi_band: Band,
    pub gl_band: Band,
    pub net_carbs: f64,
    pub match_type: MatchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_food: Option<String>,
    pub category: GiCategory,
    pub confidence: f64,
    pub relevant: bool,
    pub serving_grams: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealGlycemic {
    pub glycemic_index: f64,
    pub glycemic_load: f64,
    pub gi_band: Band,
    pub gl_band: Band,
}

pub fn is_relevant(nutrition: &NutritionRecord) -> bool {
    nutrition.carbs >= MIN_RELEVANT_CARBS
}

pub fn glycemic_load(gi: f64, net_carbs: f64) -> f64 {
    (gi * net_carbs / 100.0).round()
}

struct Found {
    gi: f64,
    match_type: MatchType,
    quality: EntryQuality,
    category: GiCategory,
    matched_food: Option<String>,
}

impl Found {
    fn from_entry(e: &GiEntry, match_type: MatchType) -> Self {
        Self {
            gi: e.gi,
            match_type,
            quality: e.quality,
            category: e.category,
            matched_food: Some(e.name.to_string()),
        }
    }

    fn from_category(category: GiCategory, match_type: MatchType) -> Self {
        Self {
            gi: category.default_gi(),
            match_type,
            quality: EntryQuality::Medium,
            category,
            matched_food: None,
        }
    }
}

/// Glycemic index / load lookup against a static reference table.
#[derive(Debug, Clone, Copy)]
pub struct GlycemicEngine {
    table: &'static [GiEntry],
}

impl Default for GlycemicEngine {
    fn default() -> Self {
        Self {
            table: REFERENCE_TABLE,
        }
    }
}

impl GlycemicEngine {
    pub fn new(table: &'static [GiEntry]) -> Self {
        Self { table }
    }

    pub fn lookup(&self, food_name: &str, nutrition: &NutritionRecord, serving_grams: f64) -> GiResult {
        let net_carbs = nutrition.net_carbs();
        if !is_relevant(nutrition) {
            return GiResult {
                glycemic_index: 0.0,
                glycemic_load: 0.0,
                gi_band: Band::Low,
                gl_band: Band::Low,
                net_carbs,
                match_type: MatchType::Default,
                matched_food: None,
                category: GiCategory::Other,
                confidence: 0.0,
                relevant: false,
                serving_grams,
            };
        }

        let query = normalize_name(food_name);
        let found = self
            .exact(&query)
            .or_else(|| self.alias(&query))
            .or_else(|| self.fuzzy(&query))
            .unwrap_or_else(|| infer_category(&query, nutrition));

        let gl = glycemic_load(found.gi, net_carbs);
        debug!(
            food = %query,
            gi = found.gi,
            gl,
            match_type = ?found.match_type,
            "glycemic lookup"
        );
        GiResult {
            glycemic_index: found.gi,
            glycemic_load: gl,
            gi_band: Band::for_gi(found.gi),
            gl_band: Band::for_gl(gl),
            net_carbs,
            match_type: found.match_type,
            matched_food: found.matched_food,
            category: found.category,
            confidence: found.quality.base_confidence() * found.match_type.multiplier(),
            relevant: true,
            serving_grams,
        }
    }

    fn exact(&self, query: &str) -> Option<Found> {
        self.table
            .iter()
            .find(|e| e.name == query)
            .map(|e| Found::from_entry(e, MatchType::Exact))
    }

    /// Equality with an alias first, then the query as a whole-word part of one.
    fn alias(&self, query: &str) -> Option<Found> {
        let padded = format!(" {query} ");
        self.table
            .iter()
            .find(|e| e.aliases.iter().any(|a| *a == query))
            .or_else(|| {
                self.table
                    .iter()
                    .find(|e| e.aliases.iter().any(|a| format!(" {a} ").contains(&padded)))
            })
            .map(|e| Found::from_entry(e, MatchType::Exact))
    }

    fn fuzzy(&self, query: &str) -> Option<Found> {
        let words = name_words(query);
        if words.is_empty() {
            return None;
        }
        let mut best: Option<(f64, &GiEntry)> = None;
        for e in self.table {
            let score = std::iter::once(e.name)
                .chain(e.aliases.iter().copied())
                .map(|candidate| overlap(&words, candidate))
                .fold(0.0, f64::max);
            if score > FUZZY_MATCH_THRESHOLD && best.map_or(true, |(s, _)| score > s) {
                best = Some((score, e));
            }
        }
        best.map(|(_, e)| Found::from_entry(e, MatchType::Fuzzy))
    }

    /// Carb-weighted meal GI across relevant items; meal GL is the sum.
    /// `None` when no item carries a relevant GI.
    pub fn meal_glycemic<'a, I>(&self, items: I) -> Option<MealGlycemic>
    where
        I: IntoIterator<Item = &'a GiResult>,
    {
        let mut weighted = 0.0;
        let mut carbs = 0.0;
        let mut gl = 0.0;
        let mut any = false;
        for r in items.into_iter().filter(|r| r.relevant) {
            any = true;
            weighted += r.glycemic_index * r.net_carbs;
            carbs += r.net_carbs;
            gl += r.glycemic_load;
        }
        if !any {
            return None;
        }
        let gi = if carbs > 0.0 { (weighted / carbs).round() } else { 0.0 };
        Some(MealGlycemic {
            glycemic_index: gi,
            glycemic_load: gl,
            gi_band: Band::for_gi(gi),
            gl_band: Band::for_gl(gl),
        })
    }
}

fn overlap(query_words: &[String], candidate: &str) -> f64 {
    let candidate_words: Vec<&str> = candidate.split(' ').collect();
    let shared = query_words
        .iter()
        .filter(|w| candidate_words.contains(&w.as_str()))
        .count();
    shared as f64 / query_words.len().max(candidate_words.len()) as f64
}

fn keyword_matches(word: &str, keyword: &str) -> bool {
    word == keyword
        || word
            .strip_prefix(keyword)
            .is_some_and(|rest| rest == "s" || rest == "es")
}

fn infer_category(query: &str, n: &NutritionRecord) -> Found {
    let words = name_words(query);
    for (category, keywords) in CATEGORY_KEYWORDS {
        if words.iter().any(|w| keywords.iter().any(|k| keyword_matches(w, k))) {
            return Found::from_category(*category, MatchType::Category);
        }
    }

    let category = if n.protein > 20.0 && n.carbs < 10.0 {
        GiCategory::Other
    } else if n.carbs > 40.0 {
        GiCategory::Grain
    } else if n.sugar > 15.0 && n.carbs > 20.0 {
        GiCategory::Fruit
    } else if n.fiber > 5.0 && n.carbs < 15.0 {
        GiCategory::Vegetable
    } else {
        GiCategory::Other
    };
    Found::from_category(category, MatchType::Default)
}
