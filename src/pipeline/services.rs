use std::sync::Arc;

use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::insights::InsightGenerator;
use crate::glycemic::{is_relevant, GiResult, GlycemicEngine, MealGlycemic};
use crate::grading::{grade, GradingResult};
use crate::nutrition::{FoodDescriptor, NutritionRecord, NutritionSource, ResolutionResult};
use crate::resolver::Resolver;

/// Concurrent calls to the insight generator.
pub const INSIGHT_CONCURRENCY: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedItem {
    pub name: String,
    pub serving_grams: f64,
    pub nutrition: NutritionRecord,
    pub nutrition_source: NutritionSource,
    pub nutrition_confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gi: Option<GiResult>,
    pub grading: GradingResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealAnalysis {
    pub id: Uuid,
    pub items: Vec<AnalyzedItem>,
    pub totals: NutritionRecord,
    pub total_grams: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_gi: Option<MealGlycemic>,
    pub grading: GradingResult,
}

/// Resolver, GI engine and grader wired together.
#[derive(Clone)]
pub struct Pipeline {
    resolver: Resolver,
    glycemic: GlycemicEngine,
    insights: Option<Arc<dyn InsightGenerator>>,
}

impl Pipeline {
    pub fn new(resolver: Resolver, glycemic: GlycemicEngine, insights: Option<Arc<dyn InsightGenerator>>) -> Self {
        Self {
            resolver,
            glycemic,
            insights,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn glycemic(&self) -> &GlycemicEngine {
        &self.glycemic
    }

    #[instrument(skip(self, descriptor), fields(name = %descriptor.name))]
    pub async fn analyze_item(&self, descriptor: &FoodDescriptor) -> AnalyzedItem {
        let resolved = self.resolver.resolve(descriptor).await;
        let mut items = vec![self.assemble(descriptor, resolved)];
        self.attach_insights(&mut items).await;
        items.remove(0)
    }

    #[instrument(skip_all, fields(items = descriptors.len()))]
    pub async fn analyze_meal(&self, descriptors: &[FoodDescriptor]) -> MealAnalysis {
        let resolved = self.resolver.batch_resolve(descriptors).await;
        let mut items: Vec<AnalyzedItem> = descriptors
            .iter()
            .map(|d| {
                let grams = d.serving_grams();
                let r = resolved
                    .get(&d.name)
                    .cloned()
                    .map(|r| r.with_serving(grams))
                    .unwrap_or_else(|| ResolutionResult::unresolved(grams));
                self.assemble(d, r)
            })
            .collect();
        self.attach_insights(&mut items).await;

        let totals = NutritionRecord::sum(items.iter().map(|i| &i.nutrition));
        let total_grams = items.iter().map(|i| i.serving_grams).sum();
        let total_gi = self.glycemic.meal_glycemic(items.iter().filter_map(|i| i.gi.as_ref()));
        let grading = grade(&totals, total_grams, None, Some(false), None);
        info!(
            calories = totals.calories,
            unresolved = items.iter().filter(|i| i.nutrition_source == NutritionSource::None).count(),
            "meal analyzed"
        );

        MealAnalysis {
            id: Uuid::new_v4(),
            items,
            totals,
            total_grams,
            total_gi,
            grading,
        }
    }

    /// GI only for carb-relevant foods; its values ride on the record so the
    /// grader sees them.
    fn assemble(&self, d: &FoodDescriptor, r: ResolutionResult) -> AnalyzedItem {
        let mut nutrition = r.nutrition;
        let gi = is_relevant(&nutrition).then(|| self.glycemic.lookup(&d.name, &nutrition, r.serving_grams));
        if let Some(g) = &gi {
            nutrition.glycemic_index = Some(g.glycemic_index);
            nutrition.glycemic_load = Some(g.glycemic_load);
        }
        let grading = grade(
            &nutrition,
            r.serving_grams,
            d.food_group.as_deref(),
            d.is_beverage,
            gi.as_ref(),
        );
        AnalyzedItem {
            name: d.name.clone(),
            serving_grams: r.serving_grams,
            nutrition,
            nutrition_source: r.source,
            nutrition_confidence: r.confidence,
            matched_label: r.label,
            gi,
            grading,
            insight: None,
        }
    }

    async fn attach_insights(&self, items: &mut [AnalyzedItem]) {
        let Some(generator) = self.insights.as_ref() else {
            return;
        };
        let lookups: Vec<_> = items
            .iter()
            .map(|item| async move {
                match generator.generate(item).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!(item = %item.name, error = %e, "insight generation failed");
                        None
                    }
                }
            })
            .collect();
        let notes: Vec<Option<String>> = stream::iter(lookups)
            .buffered(INSIGHT_CONCURRENCY)
            .collect()
            .await;
        for (item, note) in items.iter_mut().zip(notes) {
            item.insight = note;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::nutrition::FoodType;
    use crate::resolver::testing::{edamam, harness, off, usda, Harness};
    use crate::sources::fakes::FakeSource;

    fn record(calories: f64, protein: f64, carbs: f64) -> NutritionRecord {
        NutritionRecord {
            calories,
            protein,
            carbs,
            ..Default::default()
        }
    }

    fn pipeline(h: &Harness, insights: Option<Arc<dyn InsightGenerator>>) -> Pipeline {
        Pipeline::new(h.resolver.clone(), GlycemicEngine::default(), insights)
    }

    fn sources() -> FakeSource {
        usda()
            .with("steak", 0.95, record(300.0, 20.0, 0.0))
            .with("egg whites", 0.9, record(200.0, 10.0, 0.0))
            .with("white rice", 0.95, record(130.0, 2.7, 28.0))
    }

    struct CountingInsights {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl InsightGenerator for CountingInsights {
        async fn generate(&self, item: &AnalyzedItem) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::ensure!(!self.fail, "insight backend down");
            Ok(format!("{} looks fine", item.name))
        }
    }

    #[derive(Default)]
    struct SlowInsights {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl InsightGenerator for SlowInsights {
        async fn generate(&self, item: &AnalyzedItem) -> anyhow::Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(item.name.clone())
        }
    }

    #[tokio::test]
    async fn insight_calls_are_capped() {
        let slow = Arc::new(SlowInsights::default());
        let descriptors: Vec<FoodDescriptor> = (0..8)
            .map(|i| FoodDescriptor::new(format!("dish {i}"), 100.0, FoodType::GenericDish))
            .collect();
        let meal = pipeline(&harness(sources(), off(), edamam()), Some(slow.clone()))
            .analyze_meal(&descriptors)
            .await;
        assert!(meal.items.iter().all(|i| i.insight.as_deref() == Some(i.name.as_str())));
        assert_eq!(slow.peak.load(Ordering::SeqCst), INSIGHT_CONCURRENCY);
        assert!(INSIGHT_CONCURRENCY > 1);
    }

    #[tokio::test]
    async fn meal_totals_sum_with_rounding_policy() {
        let h = harness(sources(), off(), edamam());
        let meal = pipeline(&h, None)
            .analyze_meal(&[
                FoodDescriptor::new("steak", 100.0, FoodType::WholeFood),
                FoodDescriptor::new("egg whites", 100.0, FoodType::WholeFood),
            ])
            .await;
        assert_eq!(meal.items.len(), 2);
        assert_eq!(meal.totals.calories, 500.0);
        assert_eq!(meal.totals.protein, 30.0);
        assert_eq!(meal.total_grams, 200.0);
        assert!(meal.total_gi.is_none());
    }

    #[tokio::test]
    async fn relevant_item_carries_gi_onto_record_and_grading() {
        let h = harness(sources(), off(), edamam());
        let item = pipeline(&h, None)
            .analyze_item(&FoodDescriptor::new("white rice", 158.0, FoodType::WholeFood))
            .await;
        let gi = item.gi.as_ref().expect("rice is carb relevant");
        assert_eq!(gi.glycemic_index, 73.0);
        assert_eq!(item.nutrition.glycemic_index, Some(73.0));
        assert_eq!(item.nutrition.glycemic_load, Some(gi.glycemic_load));
        // high GI: -5 - 3/30*10
        assert_eq!(item.grading.gi_adjustment, Some(-6.0));
        assert_eq!(item.nutrition_source, NutritionSource::Usda);
    }

    #[tokio::test]
    async fn low_carb_item_skips_gi() {
        let h = harness(sources(), off(), edamam());
        let item = pipeline(&h, None)
            .analyze_item(&FoodDescriptor::new("steak", 200.0, FoodType::WholeFood))
            .await;
        assert!(item.gi.is_none());
        assert_eq!(item.nutrition.glycemic_index, None);
        assert_eq!(item.grading.gi_adjustment, None);
        assert_eq!(item.nutrition.calories, 600.0);
    }

    #[tokio::test]
    async fn meal_rescales_repeated_names_per_descriptor() {
        let h = harness(sources(), off(), edamam());
        let meal = pipeline(&h, None)
            .analyze_meal(&[
                FoodDescriptor::new("white rice", 100.0, FoodType::WholeFood),
                FoodDescriptor::new("white rice", 200.0, FoodType::WholeFood),
            ])
            .await;
        assert_eq!(meal.items[0].nutrition.calories, 130.0);
        assert_eq!(meal.items[1].nutrition.calories, 260.0);
        assert_eq!(meal.totals.calories, 390.0);
        let total_gi = meal.total_gi.expect("rice is carb relevant");
        assert_eq!(total_gi.glycemic_index, 73.0);
    }

    #[tokio::test]
    async fn insight_failures_leave_results_untouched() {
        let descriptors = [
            FoodDescriptor::new("steak", 100.0, FoodType::WholeFood),
            FoodDescriptor::new("white rice", 100.0, FoodType::WholeFood),
            FoodDescriptor::new("egg whites", 100.0, FoodType::WholeFood),
            FoodDescriptor::new("unicorn", 100.0, FoodType::WholeFood),
        ];

        let plain = pipeline(&harness(sources(), off(), edamam()), None)
            .analyze_meal(&descriptors)
            .await;

        let failing = Arc::new(CountingInsights {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let with_failures = pipeline(&harness(sources(), off(), edamam()), Some(failing.clone()))
            .analyze_meal(&descriptors)
            .await;
        assert_eq!(failing.calls.load(Ordering::SeqCst), 4);
        assert_eq!(plain.items, with_failures.items);
        assert_eq!(plain.totals, with_failures.totals);

        let working = Arc::new(CountingInsights {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let annotated = pipeline(&harness(sources(), off(), edamam()), Some(working))
            .analyze_meal(&descriptors)
            .await;
        assert_eq!(annotated.items[0].insight.as_deref(), Some("steak looks fine"));
        assert_eq!(annotated.items[3].insight.as_deref(), Some("unicorn looks fine"));
    }
}
