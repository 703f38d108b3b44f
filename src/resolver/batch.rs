use std::collections::{HashMap, HashSet};

use futures_util::future::join_all;
use futures_util::{stream, StreamExt};
use tracing::{debug, instrument};

use super::chain::{run_batched, FallbackChain};
use super::services::{from_cache, from_match, hybrid, should_cache, Resolver, Route, PRIMARY_MIN_CONFIDENCE};
use crate::cache::CacheWrite;
use crate::nutrition::{FoodDescriptor, FoodType, ResolutionResult};
use crate::sources::{SourceMatch, BATCH_CONCURRENCY};

struct BrandedItem<'a> {
    descriptor: &'a FoodDescriptor,
    label: FallbackChain,
    generic_query: String,
    fallback: FallbackChain,
}

type Resolved = (String, ResolutionResult);

impl Resolver {
    /// Resolves many descriptors at once, keyed by descriptor name. When two
    /// descriptors share a name the first one wins.
    #[instrument(skip_all, fields(items = descriptors.len()))]
    pub async fn batch_resolve(&self, descriptors: &[FoodDescriptor]) -> HashMap<String, ResolutionResult> {
        let mut seen = HashSet::new();
        let unique: Vec<&FoodDescriptor> = descriptors.iter().filter(|d| seen.insert(d.name.clone())).collect();

        let requests: Vec<(String, f64)> = unique.iter().map(|d| (d.name.clone(), d.serving_grams())).collect();
        let cached = self.cache.batch_get(&requests).await;

        let mut out = HashMap::with_capacity(unique.len());
        let mut groups: HashMap<FoodType, Vec<&FoodDescriptor>> = HashMap::new();
        for d in unique.iter().copied() {
            match cached.get(&d.name) {
                Some(entry) => {
                    out.insert(d.name.clone(), from_cache(entry.clone(), d.serving_grams()));
                }
                None => groups.entry(d.food_type()).or_default().push(d),
            }
        }
        debug!(hits = out.len(), groups = groups.len(), "batch cache lookup done");

        let mut fresh: HashMap<String, ResolutionResult> = join_all(groups.values().map(|items| self.grouped_pass(items)))
            .await
            .into_iter()
            .flatten()
            .collect();

        let leftovers: Vec<&FoodDescriptor> = groups
            .values()
            .flatten()
            .copied()
            .filter(|d| !fresh.contains_key(&d.name))
            .collect();
        if !leftovers.is_empty() {
            debug!(count = leftovers.len(), "resolving leftovers individually");
            let lookups: Vec<_> = leftovers
                .into_iter()
                .map(|d| async move { (d.name.clone(), self.resolve_uncached(d, d.serving_grams()).await) })
                .collect();
            let singles: Vec<Resolved> = stream::iter(lookups)
                .buffered(BATCH_CONCURRENCY)
                .collect()
                .await;
            fresh.extend(singles);
        }

        self.remember_all(&unique, &fresh);
        out.extend(fresh);
        out
    }

    /// One food-type group: chain routes run level by level through batch
    /// calls. Decomposition is left to the individual pass.
    async fn grouped_pass(&self, items: &[&FoodDescriptor]) -> Vec<Resolved> {
        let mut chain_items = Vec::new();
        let mut chains = Vec::new();
        let mut branded = Vec::new();
        for d in items.iter().copied() {
            match self.route(d) {
                Route::Chain(chain) => {
                    chain_items.push(d);
                    chains.push(chain);
                }
                Route::Branded {
                    label,
                    generic_query,
                    fallback,
                } => branded.push(BrandedItem {
                    descriptor: d,
                    label,
                    generic_query,
                    fallback,
                }),
                Route::Decompose { .. } => {}
            }
        }

        let mut out = resolved(chain_items, run_batched(&chains).await);
        if !branded.is_empty() {
            out.extend(self.branded_pass(branded).await);
        }
        out
    }

    async fn branded_pass(&self, items: Vec<BrandedItem<'_>>) -> Vec<Resolved> {
        let labels: Vec<FallbackChain> = items.iter().map(|b| b.label.clone()).collect();
        let label_hits = run_batched(&labels).await;

        let generic_queries: Vec<String> = items
            .iter()
            .zip(&label_hits)
            .filter(|(_, hit)| hit.is_some())
            .map(|(b, _)| b.generic_query.clone())
            .collect();
        let generic = if generic_queries.is_empty() {
            HashMap::new()
        } else {
            self.sources.generic.batch_search(&generic_queries).await
        };

        let mut out = Vec::new();
        let mut fallback_items = Vec::new();
        let mut fallbacks = Vec::new();
        for (b, hit) in items.into_iter().zip(label_hits) {
            let grams = b.descriptor.serving_grams();
            match hit {
                Some(m) => {
                    let g = generic
                        .get(&b.generic_query)
                        .filter(|g| g.confidence >= PRIMARY_MIN_CONFIDENCE)
                        .cloned();
                    out.push((b.descriptor.name.clone(), hybrid(m, g, grams)));
                }
                None => {
                    fallback_items.push(b.descriptor);
                    fallbacks.push(b.fallback);
                }
            }
        }
        out.extend(resolved(fallback_items, run_batched(&fallbacks).await));
        out
    }

    fn remember_all(&self, descriptors: &[&FoodDescriptor], fresh: &HashMap<String, ResolutionResult>) {
        let writes: Vec<CacheWrite> = descriptors
            .iter()
            .filter_map(|d| {
                let r = fresh.get(&d.name).filter(|r| should_cache(r))?;
                Some(CacheWrite {
                    name: d.name.clone(),
                    nutrition: r.nutrition.clone(),
                    source: r.source,
                    confidence: r.confidence,
                    serving_grams: r.serving_grams,
                    food_type: d.food_type,
                })
            })
            .collect();
        if writes.is_empty() {
            return;
        }
        let cache = self.cache.clone();
        self.cache.background().spawn("cache_batch_write", async move {
            let total = writes.len();
            let written = cache.batch_set(writes).await;
            debug!(written, total, "batch cache write");
            Ok(())
        });
    }
}

fn resolved(items: Vec<&FoodDescriptor>, matches: Vec<Option<SourceMatch>>) -> Vec<Resolved> {
    items
        .into_iter()
        .zip(matches)
        .filter_map(|(d, m)| Some((d.name.clone(), from_match(m?, d.serving_grams()))))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::nutrition::{FoodDescriptor, FoodType, IngredientPortion, NutritionSource};
    use crate::resolver::testing::{edamam, harness, off, per_100g, usda};

    #[tokio::test]
    async fn batch_mixes_cache_hits_sources_and_misses() {
        let h = harness(
            usda()
                .with("banana", 0.95, per_100g(89.0, 1.1))
                .with("granola", 0.8, per_100g(471.0, 10.0)),
            off().with("Kind granola", 0.9, per_100g(450.0, 9.0)),
            edamam(),
        );
        h.resolver
            .cache()
            .set("oatmeal", &per_100g(68.0, 2.4), NutritionSource::Usda, 0.9, 100.0, None)
            .await;

        let mut granola = FoodDescriptor::new("granola", 100.0, FoodType::BrandedPackaged);
        granola.brand_name = Some("Kind".into());
        let descriptors = vec![
            FoodDescriptor::new("oatmeal", 100.0, FoodType::WholeFood),
            FoodDescriptor::new("banana", 118.0, FoodType::WholeFood),
            granola,
            FoodDescriptor::new("dragon scales", 50.0, FoodType::WholeFood),
        ];

        let results = h.resolver.batch_resolve(&descriptors).await;
        h.resolver.cache().background().flush().await;

        assert_eq!(results.len(), 4);
        assert_eq!(results["oatmeal"].source, NutritionSource::Cache);
        assert_eq!(results["banana"].source, NutritionSource::Usda);
        assert_eq!(results["banana"].nutrition.calories, 105.0);
        assert_eq!(results["granola"].source, NutritionSource::Hybrid);
        assert_eq!(results["granola"].confidence, 0.8);
        assert_eq!(results["dragon scales"].source, NutritionSource::None);
        // oatmeal plus the two confident fresh results
        assert_eq!(h.store.len().await, 3);
    }

    #[tokio::test]
    async fn duplicate_names_are_resolved_once() {
        let h = harness(usda().with("rice", 0.9, per_100g(130.0, 2.7)), off(), edamam());
        let descriptors = vec![
            FoodDescriptor::new("rice", 150.0, FoodType::WholeFood),
            FoodDescriptor::new("rice", 300.0, FoodType::WholeFood),
        ];
        let results = h.resolver.batch_resolve(&descriptors).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results["rice"].nutrition.calories, 195.0);
        assert_eq!(h.usda.call_count(), 1);
    }

    #[tokio::test]
    async fn unresolved_items_get_an_individual_retry() {
        let h = harness(usda(), off(), edamam());
        let results = h
            .resolver
            .batch_resolve(&[FoodDescriptor::new("moon cheese", 100.0, FoodType::GenericDish)])
            .await;
        assert_eq!(results["moon cheese"].confidence, 0.0);
        assert_eq!(h.usda.call_count(), 2);
        assert_eq!(h.edamam.call_count(), 2);
    }

    #[tokio::test]
    async fn homemade_dishes_are_decomposed_in_batch() {
        let h = harness(usda().with("egg", 0.9, per_100g(155.0, 13.0)), off(), edamam());
        let mut omelette = FoodDescriptor::new("omelette", 100.0, FoodType::HomemadeDish);
        omelette.ingredients = vec![IngredientPortion {
            name: "egg".into(),
            grams: 100.0,
        }];
        let results = h.resolver.batch_resolve(&[omelette]).await;
        let r = &results["omelette"];
        assert_eq!(r.source, NutritionSource::Decomposed);
        assert_eq!(r.nutrition.calories, 155.0);
        assert!((r.confidence - 0.81).abs() < 1e-9);
    }
}
