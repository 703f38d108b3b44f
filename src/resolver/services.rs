use std::sync::Arc;

use futures_util::{stream, StreamExt};
use tracing::{debug, info, instrument};

use super::chain::FallbackChain;
use crate::cache::{CacheEntry, NutritionCache};
use crate::nutrition::{
    FoodDescriptor, FoodType, IngredientPortion, Nutrient, NutritionRecord, NutritionSource,
    ResolutionResult,
};
use crate::sources::{FoodSource, SourceMatch, BATCH_CONCURRENCY};

pub const PRIMARY_MIN_CONFIDENCE: f64 = 0.7;
pub const LAST_RESORT_MIN_CONFIDENCE: f64 = 0.6;
pub const CACHE_WRITE_MIN_CONFIDENCE: f64 = 0.6;
/// Penalty for summing independently resolved ingredients.
pub const DECOMPOSITION_PENALTY: f64 = 0.9;

/// The three external databases, by role.
#[derive(Clone)]
pub struct Sources {
    /// Authoritative generic-food database.
    pub generic: Arc<dyn FoodSource>,
    /// Barcode / label database.
    pub label: Arc<dyn FoodSource>,
    /// Broad commercial and restaurant database.
    pub commercial: Arc<dyn FoodSource>,
}

/// How a cache miss is resolved.
pub(crate) enum Route {
    Chain(FallbackChain),
    Branded {
        label: FallbackChain,
        generic_query: String,
        fallback: FallbackChain,
    },
    Decompose {
        ingredients: Vec<IngredientPortion>,
        fallback: FallbackChain,
    },
}

/// Cache-first, multi-source nutrition resolver.
#[derive(Clone)]
pub struct Resolver {
    pub(crate) cache: NutritionCache,
    pub(crate) sources: Sources,
}

fn qualified(prefix: Option<&str>, name: &str) -> String {
    match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => format!("{p} {name}"),
        None => name.to_string(),
    }
}

impl Resolver {
    pub fn new(cache: NutritionCache, sources: Sources) -> Self {
        Self { cache, sources }
    }

    pub fn cache(&self) -> &NutritionCache {
        &self.cache
    }

    pub(crate) fn whole_food_chain(&self, name: &str) -> FallbackChain {
        FallbackChain::new()
            .then(&self.sources.generic, name, PRIMARY_MIN_CONFIDENCE)
            .then(&self.sources.label, name, PRIMARY_MIN_CONFIDENCE)
            .then(&self.sources.commercial, name, LAST_RESORT_MIN_CONFIDENCE)
    }

    pub(crate) fn generic_dish_chain(&self, name: &str) -> FallbackChain {
        FallbackChain::new()
            .then(&self.sources.generic, name, PRIMARY_MIN_CONFIDENCE)
            .then(&self.sources.commercial, name, LAST_RESORT_MIN_CONFIDENCE)
    }

    pub(crate) fn route(&self, d: &FoodDescriptor) -> Route {
        let name = d.name.trim();
        match d.food_type() {
            FoodType::WholeFood => Route::Chain(self.whole_food_chain(name)),
            FoodType::BrandedPackaged => {
                let query = qualified(d.brand_name.as_deref(), name);
                Route::Branded {
                    label: FallbackChain::new().then(&self.sources.label, query.clone(), PRIMARY_MIN_CONFIDENCE),
                    generic_query: name.to_string(),
                    fallback: FallbackChain::new().then(&self.sources.commercial, query, LAST_RESORT_MIN_CONFIDENCE),
                }
            }
            FoodType::RestaurantItem => {
                let query = qualified(d.restaurant_name.as_deref(), name);
                Route::Chain(
                    FallbackChain::new()
                        .then(&self.sources.commercial, query.clone(), PRIMARY_MIN_CONFIDENCE)
                        .then(&self.sources.label, query, PRIMARY_MIN_CONFIDENCE)
                        .followed_by(self.generic_dish_chain(name)),
                )
            }
            FoodType::HomemadeDish if !d.ingredients.is_empty() => Route::Decompose {
                ingredients: d.ingredients.clone(),
                fallback: self.generic_dish_chain(name),
            },
            FoodType::HomemadeDish | FoodType::GenericDish => Route::Chain(self.generic_dish_chain(name)),
        }
    }

    #[instrument(skip(self, d), fields(name = %d.name, food_type = d.food_type().as_str()))]
    pub async fn resolve(&self, d: &FoodDescriptor) -> ResolutionResult {
        let grams = d.serving_grams();
        if let Some(entry) = self.cache.get(&d.name, grams).await {
            debug!(cached_source = entry.source.as_str(), "served from cache");
            return from_cache(entry, grams);
        }

        let result = self.resolve_uncached(d, grams).await;
        info!(
            source = result.source.as_str(),
            confidence = result.confidence,
            "resolved"
        );
        self.remember(&d.name, d.food_type, &result);
        result
    }

    pub(crate) async fn resolve_uncached(&self, d: &FoodDescriptor, grams: f64) -> ResolutionResult {
        let resolved = match self.route(d) {
            Route::Chain(chain) => chain.run().await.map(|m| from_match(m, grams)),
            Route::Branded {
                label,
                generic_query,
                fallback,
            } => match label.run().await {
                Some(label_match) => {
                    let generic = self
                        .sources
                        .generic
                        .search(&generic_query)
                        .await
                        .filter(|m| m.confidence >= PRIMARY_MIN_CONFIDENCE);
                    Some(hybrid(label_match, generic, grams))
                }
                None => fallback.run().await.map(|m| from_match(m, grams)),
            },
            Route::Decompose {
                ingredients,
                fallback,
            } => match self.decompose(&ingredients).await {
                Some(r) => Some(r.with_serving(grams)),
                None => fallback.run().await.map(|m| from_match(m, grams)),
            },
        };
        resolved.unwrap_or_else(|| ResolutionResult::unresolved(grams))
    }

    /// Resolves every ingredient as a whole food and sums them. Unresolved
    /// ingredients count as zero confidence in the average.
    pub(crate) async fn decompose(&self, ingredients: &[IngredientPortion]) -> Option<ResolutionResult> {
        if ingredients.is_empty() {
            return None;
        }
        let lookups: Vec<_> = ingredients.iter().map(|i| self.resolve_ingredient(i)).collect();
        let parts: Vec<ResolutionResult> = stream::iter(lookups)
            .buffered(BATCH_CONCURRENCY)
            .collect()
            .await;

        if parts.iter().all(|p| !p.is_resolved()) {
            return None;
        }
        let avg = parts.iter().map(|p| p.confidence).sum::<f64>() / parts.len() as f64;
        let nutrition = NutritionRecord::sum(parts.iter().map(|p| &p.nutrition));
        let total_grams = ingredients.iter().map(|i| i.grams).sum();
        Some(ResolutionResult {
            nutrition,
            source: NutritionSource::Decomposed,
            confidence: avg * DECOMPOSITION_PENALTY,
            serving_grams: total_grams,
            label: None,
        })
    }

    async fn resolve_ingredient(&self, i: &IngredientPortion) -> ResolutionResult {
        let grams = if i.grams > 0.0 { i.grams } else { 0.0 };
        if let Some(entry) = self.cache.get(&i.name, grams).await {
            return from_cache(entry, grams);
        }
        let result = self
            .whole_food_chain(i.name.trim())
            .run()
            .await
            .map(|m| from_match(m, grams))
            .unwrap_or_else(|| ResolutionResult::unresolved(grams));
        self.remember(&i.name, Some(FoodType::WholeFood), &result);
        result
    }

    /// Writes a confident, freshly resolved result back to the cache without
    /// waiting for it.
    pub(crate) fn remember(&self, name: &str, food_type: Option<FoodType>, r: &ResolutionResult) {
        if !should_cache(r) {
            return;
        }
        let cache = self.cache.clone();
        let name = name.to_string();
        let r = r.clone();
        self.cache.background().spawn("cache_write", async move {
            cache
                .set(&name, &r.nutrition, r.source, r.confidence, r.serving_grams, food_type)
                .await;
            Ok(())
        });
    }
}

pub(crate) fn should_cache(r: &ResolutionResult) -> bool {
    r.confidence >= CACHE_WRITE_MIN_CONFIDENCE
        && !matches!(r.source, NutritionSource::Cache | NutritionSource::None)
}

pub(crate) fn from_cache(entry: CacheEntry, grams: f64) -> ResolutionResult {
    ResolutionResult {
        nutrition: entry.nutrition.scaled(entry.serving_grams, grams).rounded(),
        source: NutritionSource::Cache,
        confidence: entry.confidence,
        serving_grams: grams,
        label: None,
    }
}

pub(crate) fn from_match(m: SourceMatch, grams: f64) -> ResolutionResult {
    ResolutionResult {
        nutrition: m.nutrition.scaled(m.serving_grams, grams).rounded(),
        source: m.source,
        confidence: m.confidence,
        serving_grams: grams,
        label: Some(m.label),
    }
}

/// Label-database macros combined with generic-database micronutrients.
pub(crate) fn hybrid(label: SourceMatch, generic: Option<SourceMatch>, grams: f64) -> ResolutionResult {
    let Some(generic) = generic else {
        return from_match(label, grams);
    };
    let macros = label.nutrition.scaled(label.serving_grams, grams);
    let micros = generic.nutrition.scaled(generic.serving_grams, grams);
    let mut merged = NutritionRecord::default();
    for n in Nutrient::ALL {
        let v = if n.is_label_macro() { macros.get(n) } else { micros.get(n) };
        merged.set(n, v);
    }
    ResolutionResult {
        nutrition: merged.rounded(),
        source: NutritionSource::Hybrid,
        confidence: label.confidence.min(generic.confidence),
        serving_grams: grams,
        label: Some(label.label),
    }
}

impl ResolutionResult {
    /// Re-expresses a result for a different serving size.
    pub(crate) fn with_serving(self, grams: f64) -> Self {
        if (self.serving_grams - grams).abs() < f64::EPSILON {
            return self;
        }
        Self {
            nutrition: self.nutrition.scaled(self.serving_grams, grams).rounded(),
            serving_grams: grams,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::testing::{edamam, harness, off, per_100g, usda};

    #[tokio::test]
    async fn second_resolve_is_served_from_cache() {
        let h = harness(usda().with("apple", 0.95, per_100g(52.0, 0.3)), off(), edamam());
        let d = FoodDescriptor::new("apple", 182.0, FoodType::WholeFood);

        let first = h.resolver.resolve(&d).await;
        assert_eq!(first.source, NutritionSource::Usda);
        assert_eq!(first.nutrition.calories, 95.0);
        h.resolver.cache().background().flush().await;

        let second = h.resolver.resolve(&d).await;
        assert_eq!(second.source, NutritionSource::Cache);
        assert_eq!(second.confidence, 0.95);
        assert_eq!(second.nutrition.calories, 95.0);
        assert_eq!(h.usda.call_count(), 1);
        assert_eq!(h.off.call_count(), 0);
        assert_eq!(h.edamam.call_count(), 0);
    }

    #[tokio::test]
    async fn cache_hit_scales_to_requested_serving() {
        let h = harness(usda().with("chicken breast", 0.95, per_100g(165.0, 30.0)), off(), edamam());
        let hundred = FoodDescriptor::new("chicken breast", 100.0, FoodType::WholeFood);
        h.resolver.resolve(&hundred).await;
        h.resolver.cache().background().flush().await;

        // 105 g shares the 100 g cache bucket
        let d = FoodDescriptor::new("chicken breast", 105.0, FoodType::WholeFood);
        let r = h.resolver.resolve(&d).await;
        assert_eq!(r.source, NutritionSource::Cache);
        assert_eq!(r.serving_grams, 105.0);
        assert_eq!(r.nutrition.calories, 173.0);
        assert_eq!(r.nutrition.protein, 31.5);
    }

    #[tokio::test]
    async fn whole_food_falls_back_to_label_database() {
        // primary unreachable: the fake simply has no answer
        let h = harness(
            usda(),
            off().with("grilled chicken breast", 0.72, per_100g(165.0, 31.0)),
            edamam().with("grilled chicken breast", 0.99, per_100g(1.0, 1.0)),
        );
        let d = FoodDescriptor::new("grilled chicken breast", 170.0, FoodType::WholeFood);
        let r = h.resolver.resolve(&d).await;
        assert_ne!(r.source, NutritionSource::Usda);
        assert_eq!(r.source, NutritionSource::OpenFoodFacts);
        assert_eq!(r.confidence, 0.72);
        assert!((r.nutrition.calories - 280.5).abs() <= 0.5);
        assert_eq!(h.edamam.call_count(), 0);
    }

    #[tokio::test]
    async fn whole_food_thresholds_per_step() {
        let h = harness(
            usda().with("kale", 0.69, per_100g(49.0, 4.3)),
            off().with("kale", 0.5, per_100g(49.0, 4.3)),
            edamam().with("kale", 0.61, per_100g(35.0, 2.9)),
        );
        let r = h
            .resolver
            .resolve(&FoodDescriptor::new("kale", 100.0, FoodType::WholeFood))
            .await;
        assert_eq!(r.source, NutritionSource::Edamam);
        assert_eq!(r.confidence, 0.61);
    }

    #[tokio::test]
    async fn branded_item_merges_label_macros_with_generic_micros() {
        let label = NutritionRecord {
            calories: 500.0,
            protein: 7.0,
            vitamin_c: 0.0,
            ..Default::default()
        };
        let generic = NutritionRecord {
            calories: 480.0,
            protein: 6.0,
            vitamin_c: 12.0,
            iron: 2.0,
            ..Default::default()
        };
        let h = harness(
            usda().with("dark chocolate bar", 0.8, generic),
            off().with("Lindt dark chocolate bar", 0.92, label),
            edamam(),
        );
        let mut d = FoodDescriptor::new("dark chocolate bar", 50.0, FoodType::BrandedPackaged);
        d.brand_name = Some("Lindt".into());

        let r = h.resolver.resolve(&d).await;
        assert_eq!(r.source, NutritionSource::Hybrid);
        assert_eq!(r.confidence, 0.8);
        assert_eq!(r.nutrition.calories, 250.0);
        assert_eq!(r.nutrition.protein, 3.5);
        assert_eq!(r.nutrition.vitamin_c, 6.0);
        assert_eq!(r.nutrition.iron, 1.0);
        assert_eq!(h.off.seen(), vec!["Lindt dark chocolate bar".to_string()]);
    }

    #[tokio::test]
    async fn branded_without_generic_match_keeps_label_result() {
        let h = harness(
            usda(),
            off().with("Lindt dark chocolate bar", 0.92, per_100g(500.0, 7.0)),
            edamam(),
        );
        let mut d = FoodDescriptor::new("dark chocolate bar", 100.0, FoodType::BrandedPackaged);
        d.brand_name = Some("Lindt".into());
        let r = h.resolver.resolve(&d).await;
        assert_eq!(r.source, NutritionSource::OpenFoodFacts);
        assert_eq!(r.confidence, 0.92);
    }

    #[tokio::test]
    async fn branded_label_miss_falls_back_to_commercial() {
        let h = harness(
            usda(),
            off(),
            edamam().with("Lindt dark chocolate bar", 0.64, per_100g(530.0, 6.0)),
        );
        let mut d = FoodDescriptor::new("dark chocolate bar", 100.0, FoodType::BrandedPackaged);
        d.brand_name = Some("Lindt".into());
        let r = h.resolver.resolve(&d).await;
        assert_eq!(r.source, NutritionSource::Edamam);
        assert_eq!(r.confidence, 0.64);
    }

    #[tokio::test]
    async fn restaurant_item_uses_qualified_query_then_generic_route() {
        let h = harness(
            usda().with("burrito", 0.8, per_100g(206.0, 8.0)),
            off(),
            edamam(),
        );
        let mut d = FoodDescriptor::new("burrito", 300.0, FoodType::RestaurantItem);
        d.restaurant_name = Some("Chipotle".into());

        let r = h.resolver.resolve(&d).await;
        assert_eq!(r.source, NutritionSource::Usda);
        assert_eq!(h.edamam.seen(), vec!["Chipotle burrito".to_string()]);
        assert_eq!(h.off.seen(), vec!["Chipotle burrito".to_string()]);
    }

    #[tokio::test]
    async fn unnamed_restaurant_asks_commercial_source_once() {
        let h = harness(usda(), off(), edamam().with("burrito", 0.65, per_100g(206.0, 8.0)));
        let d = FoodDescriptor::new("burrito", 100.0, FoodType::RestaurantItem);

        let r = h.resolver.resolve(&d).await;
        assert_eq!(r.source, NutritionSource::Edamam);
        assert_eq!(r.confidence, 0.65);
        assert_eq!(h.edamam.seen(), vec!["burrito".to_string()]);
        assert_eq!(h.off.call_count(), 1);
        assert_eq!(h.usda.call_count(), 1);
    }

    #[tokio::test]
    async fn homemade_dish_is_decomposed_with_penalty() {
        let h = harness(
            usda()
                .with("white rice", 0.9, per_100g(130.0, 2.7))
                .with("chicken thigh", 0.8, per_100g(209.0, 26.0)),
            off(),
            edamam(),
        );
        let mut d = FoodDescriptor::new("chicken and rice", 250.0, FoodType::HomemadeDish);
        d.ingredients = vec![
            IngredientPortion {
                name: "white rice".into(),
                grams: 150.0,
            },
            IngredientPortion {
                name: "chicken thigh".into(),
                grams: 100.0,
            },
        ];

        let r = h.resolver.resolve(&d).await;
        assert_eq!(r.source, NutritionSource::Decomposed);
        assert!((r.confidence - (0.9 + 0.8) / 2.0 * 0.9).abs() < 1e-9);
        assert_eq!(r.nutrition.calories, 195.0 + 209.0);
        assert_eq!(r.serving_grams, 250.0);
    }

    #[tokio::test]
    async fn partial_decomposition_degrades_confidence() {
        let h = harness(usda().with("white rice", 0.9, per_100g(130.0, 2.7)), off(), edamam());
        let mut d = FoodDescriptor::new("mystery stew", 300.0, FoodType::HomemadeDish);
        d.ingredients = vec![
            IngredientPortion {
                name: "white rice".into(),
                grams: 100.0,
            },
            IngredientPortion {
                name: "secret sauce".into(),
                grams: 200.0,
            },
        ];
        let r = h.resolver.resolve(&d).await;
        assert_eq!(r.source, NutritionSource::Decomposed);
        assert!((r.confidence - 0.45 * 0.9).abs() < 1e-9);
        assert_eq!(r.nutrition.calories, 130.0);
    }

    #[tokio::test]
    async fn exhaustion_returns_zero_confidence_and_caches_nothing() {
        let h = harness(usda(), off(), edamam());
        let d = FoodDescriptor::new("moon cheese", 80.0, FoodType::WholeFood);
        let r = h.resolver.resolve(&d).await;
        h.resolver.cache().background().flush().await;

        assert_eq!(r.source, NutritionSource::None);
        assert_eq!(r.confidence, 0.0);
        assert!(r.nutrition.is_empty());
        assert_eq!(r.serving_grams, 80.0);
        assert_eq!(h.store.len().await, 0);
    }

    #[tokio::test]
    async fn missing_food_type_takes_generic_dish_route() {
        let h = harness(
            usda(),
            off().with("pad thai", 0.99, per_100g(1.0, 1.0)),
            edamam().with("pad thai", 0.7, per_100g(180.0, 8.0)),
        );
        let mut d = FoodDescriptor::new("pad thai", 100.0, FoodType::GenericDish);
        d.food_type = None;
        let r = h.resolver.resolve(&d).await;
        assert_eq!(r.source, NutritionSource::Edamam);
        assert_eq!(h.off.call_count(), 0);
    }
}
