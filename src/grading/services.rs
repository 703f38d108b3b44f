use tracing::debug;

use super::focus::{adjust, score_focus};
use super::scores::{
    gi_adjustment, inflammatory_index, nutri_score_points, nutri_score_to_score, satiety_score,
    GI_WEIGHT_BLOOD_SUGAR, GI_WEIGHT_ENERGY, GI_WEIGHT_WEIGHT_MANAGEMENT,
};
use super::types::{
    Grade, GradingResult, Inflammatory, InflammatoryLevel, OverallScore, Satiety, SatietyLevel,
    WellnessFocus,
};
use crate::glycemic::{Band, GiResult};
use crate::nutrition::{NutritionRecord, DEFAULT_SERVING_GRAMS};

const BEVERAGE_GROUPS: [&str; 2] = ["beverage", "beverages"];
/// Cap on strengths and concerns surfaced per food.
const MAX_HIGHLIGHTS: usize = 5;

/// Grades one serving. Scoring runs on per-100 g densities so portion size
/// does not move the grade.
pub fn grade(
    nutrition: &NutritionRecord,
    serving_grams: f64,
    food_group: Option<&str>,
    is_beverage: Option<bool>,
    gi: Option<&GiResult>,
) -> GradingResult {
    let grams = if serving_grams.is_finite() && serving_grams > 0.0 {
        serving_grams
    } else {
        DEFAULT_SERVING_GRAMS
    };
    let per_100g = nutrition.scaled(grams, 100.0);
    let beverage = is_beverage.unwrap_or_else(|| {
        food_group.is_some_and(|g| BEVERAGE_GROUPS.contains(&g.trim().to_lowercase().as_str()))
    });

    let points = nutri_score_points(&per_100g, food_group, beverage);
    let overall_score = nutri_score_to_score(points, beverage);
    let mut focuses: Vec<_> = WellnessFocus::ALL.iter().map(|f| score_focus(*f, &per_100g)).collect();

    let gi_points = gi.and_then(gi_adjustment);
    if let (Some(points), Some(gi)) = (gi_points, gi) {
        let note = gi_note(gi);
        for f in focuses.iter_mut() {
            let weight = match f.focus {
                WellnessFocus::BloodSugarBalance => GI_WEIGHT_BLOOD_SUGAR,
                WellnessFocus::WeightManagement => GI_WEIGHT_WEIGHT_MANAGEMENT,
                WellnessFocus::EnergyEndurance => GI_WEIGHT_ENERGY,
                _ => continue,
            };
            adjust(f, points * weight, note.clone());
        }
    }

    let satiety = satiety_score(&per_100g);
    let index = inflammatory_index(&per_100g);
    debug!(points, overall_score, satiety, index, gi_adjustment = ?gi_points, "graded");
    let strengths = highlights(focuses.iter().map(|f| &f.pros));
    let concerns = highlights(focuses.iter().map(|f| &f.cons));

    GradingResult {
        overall: OverallScore {
            score: overall_score,
            grade: Grade::from_score(overall_score),
            nutri_score_points: points,
        },
        focuses,
        satiety: Satiety {
            score: satiety,
            level: SatietyLevel::from_score(satiety),
        },
        inflammatory: Inflammatory {
            index,
            level: InflammatoryLevel::from_index(index),
        },
        strengths,
        concerns,
        gi_adjustment: gi_points,
    }
}

/// Notes shared by several focuses appear once, in focus order.
fn highlights<'a>(notes: impl Iterator<Item = &'a Vec<String>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for note in notes.flatten() {
        if out.len() == MAX_HIGHLIGHTS {
            break;
        }
        if !out.contains(note) {
            out.push(note.clone());
        }
    }
    out
}

fn gi_note(gi: &GiResult) -> String {
    let band = match gi.gi_band {
        Band::Low => "Low",
        Band::Medium => "Medium",
        Band::High => "High",
    };
    format!("{band} glycemic index (GI {})", gi.glycemic_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glycemic::GlycemicEngine;

    fn apple() -> NutritionRecord {
        NutritionRecord {
            calories: 95.0,
            carbs: 25.0,
            fiber: 4.4,
            sugar: 19.0,
            potassium: 195.0,
            vitamin_c: 8.4,
            water: 156.0,
            ..Default::default()
        }
    }

    #[test]
    fn grades_are_independent_of_portion_size() {
        let small = grade(&apple(), 182.0, Some("fruit"), None, None);
        let doubled = NutritionRecord::sum([&apple(), &apple()]);
        let large = grade(&doubled, 364.0, Some("fruit"), None, None);
        assert_eq!(small.overall, large.overall);
        assert_eq!(small.focuses.len(), 10);
        assert_eq!(small.focuses, large.focuses);
    }

    #[test]
    fn gi_adjustment_touches_only_three_focuses() {
        let engine = GlycemicEngine::default();
        let gi = engine.lookup("apple", &apple(), 182.0);
        let plain = grade(&apple(), 182.0, Some("fruit"), None, None);
        let adjusted = grade(&apple(), 182.0, Some("fruit"), None, Some(&gi));

        // GI 36: 5 + 19/55*10
        assert_eq!(adjusted.gi_adjustment, Some(8.5));
        for (before, after) in plain.focuses.iter().zip(&adjusted.focuses) {
            let expected = match before.focus {
                WellnessFocus::BloodSugarBalance => 8.5,
                WellnessFocus::WeightManagement => 8.5 * 0.6,
                WellnessFocus::EnergyEndurance => 8.5 * 0.4,
                _ => 0.0,
            };
            let want = (f64::from(before.score) + expected).round().clamp(0.0, 100.0) as u8;
            assert_eq!(after.score, want, "{:?}", before.focus);
            assert_eq!(after.grade, Grade::from_score(want));
        }
        assert_eq!(plain.overall, adjusted.overall);
    }

    #[test]
    fn untrusted_gi_is_ignored() {
        let engine = GlycemicEngine::default();
        // category match: 0.80 * 0.60 < 0.6
        let gi = engine.lookup("multigrain bread roll", &apple(), 182.0);
        assert!(gi.confidence < 0.6);
        let r = grade(&apple(), 182.0, None, None, Some(&gi));
        assert_eq!(r.gi_adjustment, None);
        assert_eq!(r, grade(&apple(), 182.0, None, None, None));
    }

    #[test]
    fn beverage_flag_uses_beverage_thresholds() {
        let cola = NutritionRecord {
            calories: 139.0,
            carbs: 35.0,
            sugar: 35.0,
            sodium: 15.0,
            ..Default::default()
        };
        let as_drink = grade(&cola, 330.0, Some("beverage"), None, None);
        let as_food = grade(&cola, 330.0, None, Some(false), None);
        assert!(as_drink.overall.nutri_score_points > as_food.overall.nutri_score_points);
        assert_eq!(as_drink.overall.grade, Grade::F);
    }

    #[test]
    fn non_positive_serving_falls_back_to_default_portion() {
        let r = grade(&apple(), 0.0, None, None, None);
        let hundred = grade(&apple(), 100.0, None, None, None);
        assert_eq!(r, hundred);
    }

    #[test]
    fn strengths_and_concerns_come_from_focus_notes() {
        let salami = NutritionRecord {
            calories: 425.0,
            protein: 22.0,
            fat: 37.0,
            saturated_fat: 13.0,
            sodium: 1700.0,
            ..Default::default()
        };
        let r = grade(&salami, 50.0, None, None, None);
        assert!(!r.concerns.is_empty());
        assert!(r.concerns.len() <= MAX_HIGHLIGHTS);
        assert!(r.strengths.len() <= MAX_HIGHLIGHTS);
        for c in &r.concerns {
            assert!(r.focuses.iter().any(|f| f.cons.contains(c)));
            assert_eq!(r.concerns.iter().filter(|x| *x == c).count(), 1);
        }
        for s in &r.strengths {
            assert!(r.focuses.iter().any(|f| f.pros.contains(s)));
        }
    }
}
