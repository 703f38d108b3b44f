//! Numeric sub-scores shared by the grader: Nutri-Score points, satiety,
//! inflammatory index and the GI adjustment. All thresholds live here.

use crate::glycemic::{Band, GiResult};
use crate::nutrition::NutritionRecord;

pub const KJ_PER_KCAL: f64 = 4.184;

// Nutri-Score 2017, per 100 g. A value strictly above the n-th threshold
// scores n points.
const ENERGY_KJ: [f64; 10] = [335.0, 670.0, 1005.0, 1340.0, 1675.0, 2010.0, 2345.0, 2680.0, 3015.0, 3350.0];
const SUGARS_G: [f64; 10] = [4.5, 9.0, 13.5, 18.0, 22.5, 27.0, 31.0, 36.0, 40.0, 45.0];
const SATURATED_FAT_G: [f64; 10] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
const SODIUM_MG: [f64; 10] = [90.0, 180.0, 270.0, 360.0, 450.0, 540.0, 630.0, 720.0, 810.0, 900.0];
const FIBRE_G: [f64; 5] = [0.9, 1.9, 2.8, 3.7, 4.7];
const PROTEIN_G: [f64; 5] = [1.6, 3.2, 4.8, 6.4, 8.0];
const BEVERAGE_ENERGY_KJ: [f64; 10] = [0.0, 30.0, 60.0, 90.0, 120.0, 150.0, 180.0, 210.0, 240.0, 270.0];
const BEVERAGE_SUGARS_G: [f64; 10] = [0.0, 1.5, 3.0, 4.5, 6.0, 7.5, 9.0, 10.5, 12.0, 13.5];
/// Above this many negative points protein only counts for fruit/veg-heavy foods.
const PROTEIN_CAP_NEGATIVE_POINTS: i32 = 11;
const FRUIT_VEG_GROUPS: [&str; 4] = ["fruit", "vegetable", "vegetables", "legume"];

// Satiety
const SATIETY_PROTEIN_MAX: f64 = 40.0;
const SATIETY_PROTEIN_FULL_PCT: f64 = 40.0;
const SATIETY_FIBRE_MAX: f64 = 30.0;
const SATIETY_FIBRE_FULL_G: f64 = 6.0;
const SATIETY_WATER_MAX: f64 = 30.0;

// Inflammatory index weights, per 100 g
const INFL_SATURATED_FAT: f64 = 0.1;
const INFL_TRANS_FAT: f64 = 0.5;
const INFL_SUGAR: f64 = 0.02;
const INFL_SODIUM_PER_G: f64 = 0.2;
const INFL_FIBRE: f64 = -0.08;
const INFL_OMEGA3: f64 = -0.4;
const INFL_VITAMIN_C_PER_100MG: f64 = -0.3;
const INFL_VITAMIN_E: f64 = -0.05;
const INFL_MAGNESIUM_PER_100MG: f64 = -0.2;
const INFL_LIMIT: f64 = 2.0;

// GI adjustment. Kept as found; pending review.
pub const GI_MIN_CONFIDENCE: f64 = 0.6;
const GI_LOW_BASE: f64 = 5.0;
const GI_MEDIUM_BASE: f64 = 5.0;
const GI_HIGH_BASE: f64 = -5.0;
const GI_SPAN: f64 = 10.0;
const GI_LOW_CEILING: f64 = 55.0;
const GI_MEDIUM_FLOOR: f64 = 56.0;
const GI_MEDIUM_WIDTH: f64 = 13.0;
const GI_HIGH_FLOOR: f64 = 70.0;
const GI_HIGH_WIDTH: f64 = 30.0;
pub const GI_WEIGHT_BLOOD_SUGAR: f64 = 1.0;
pub const GI_WEIGHT_WEIGHT_MANAGEMENT: f64 = 0.6;
pub const GI_WEIGHT_ENERGY: f64 = 0.4;

fn points(value: f64, thresholds: &[f64]) -> i32 {
    thresholds.iter().filter(|t| value > **t).count() as i32
}

/// Nutri-Score point total for a per-100 g record.
pub fn nutri_score_points(n: &NutritionRecord, food_group: Option<&str>, is_beverage: bool) -> i32 {
    let kj = n.calories * KJ_PER_KCAL;
    let (energy, sugars) = if is_beverage {
        (&BEVERAGE_ENERGY_KJ, &BEVERAGE_SUGARS_G)
    } else {
        (&ENERGY_KJ, &SUGARS_G)
    };
    let negative = points(kj, energy)
        + points(n.sugar, sugars)
        + points(n.saturated_fat, &SATURATED_FAT_G)
        + points(n.sodium, &SODIUM_MG);

    let fruit_veg = food_group
        .map(|g| g.trim().to_lowercase())
        .is_some_and(|g| FRUIT_VEG_GROUPS.contains(&g.as_str()));
    let fruit = match (fruit_veg, is_beverage) {
        (true, true) => 10,
        (true, false) => 5,
        _ => 0,
    };
    let fibre = points(n.fiber, &FIBRE_G);
    let protein = points(n.protein, &PROTEIN_G);

    if negative >= PROTEIN_CAP_NEGATIVE_POINTS && fruit < 5 {
        negative - fibre - fruit
    } else {
        negative - fibre - protein - fruit
    }
}

fn lerp(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    let x = x.clamp(x0.min(x1), x0.max(x1));
    y0 + (x - x0) / (x1 - x0) * (y1 - y0)
}

/// Maps Nutri-Score points onto 0-100 so that the Nutri-Score letter bands
/// fall on the A-F score thresholds.
pub fn nutri_score_to_score(points: i32, is_beverage: bool) -> u8 {
    let p = f64::from(points);
    let score = if is_beverage {
        match points {
            i32::MIN..=1 => lerp(p, -15.0, 1.0, 84.0, 70.0),
            2..=5 => lerp(p, 2.0, 5.0, 69.0, 55.0),
            6..=9 => lerp(p, 6.0, 9.0, 54.0, 40.0),
            _ => lerp(p, 10.0, 40.0, 39.0, 0.0),
        }
    } else {
        match points {
            i32::MIN..=-1 => lerp(p, -15.0, -1.0, 100.0, 85.0),
            0..=2 => lerp(p, 0.0, 2.0, 84.0, 70.0),
            3..=10 => lerp(p, 3.0, 10.0, 69.0, 55.0),
            11..=18 => lerp(p, 11.0, 18.0, 54.0, 40.0),
            _ => lerp(p, 19.0, 40.0, 39.0, 0.0),
        }
    };
    to_score(score)
}

pub fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Water share of a per-100 g record; estimated from the macros when missing.
pub fn water_grams(n: &NutritionRecord) -> f64 {
    if n.water > 0.0 {
        n.water
    } else {
        (100.0 - n.protein - n.carbs - n.fat).clamp(0.0, 100.0)
    }
}

pub fn protein_energy_pct(n: &NutritionRecord) -> f64 {
    if n.calories > 0.0 {
        n.protein * 4.0 / n.calories * 100.0
    } else {
        0.0
    }
}

/// Satiety from protein's share of energy, fibre and water, per 100 g.
pub fn satiety_score(n: &NutritionRecord) -> u8 {
    let protein = (protein_energy_pct(n) / SATIETY_PROTEIN_FULL_PCT).min(1.0) * SATIETY_PROTEIN_MAX;
    let fibre = (n.fiber / SATIETY_FIBRE_FULL_G).min(1.0) * SATIETY_FIBRE_MAX;
    let water = water_grams(n) / 100.0 * SATIETY_WATER_MAX;
    to_score(protein + fibre + water)
}

/// Dietary-inflammation estimate; negative is anti-inflammatory.
pub fn inflammatory_index(n: &NutritionRecord) -> f64 {
    let raw = n.saturated_fat * INFL_SATURATED_FAT
        + n.trans_fat * INFL_TRANS_FAT
        + n.sugar * INFL_SUGAR
        + n.sodium / 1000.0 * INFL_SODIUM_PER_G
        + n.fiber * INFL_FIBRE
        + n.omega3 * INFL_OMEGA3
        + n.vitamin_c / 100.0 * INFL_VITAMIN_C_PER_100MG
        + n.vitamin_e * INFL_VITAMIN_E
        + n.magnesium / 100.0 * INFL_MAGNESIUM_PER_100MG;
    (raw.clamp(-INFL_LIMIT, INFL_LIMIT) * 100.0).round() / 100.0
}

/// Score points implied by a GI, before focus weighting. `None` when the GI
/// is not relevant or not trustworthy enough.
pub fn gi_adjustment(gi: &GiResult) -> Option<f64> {
    if !gi.relevant || gi.confidence < GI_MIN_CONFIDENCE {
        return None;
    }
    let v = gi.glycemic_index;
    let adj = match Band::for_gi(v) {
        Band::Low => GI_LOW_BASE + (GI_LOW_CEILING - v).max(0.0) / GI_LOW_CEILING * GI_SPAN,
        Band::Medium => GI_MEDIUM_BASE - (v - GI_MEDIUM_FLOOR).max(0.0) / GI_MEDIUM_WIDTH * GI_SPAN,
        Band::High => GI_HIGH_BASE - (v - GI_HIGH_FLOOR).clamp(0.0, GI_HIGH_WIDTH) / GI_HIGH_WIDTH * GI_SPAN,
    };
    Some((adj * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glycemic::{GiCategory, MatchType};

    fn gi(value: f64, confidence: f64) -> GiResult {
        GiResult {
            glycemic_index: value,
            glycemic_load: 10.0,
            gi_band: Band::for_gi(value),
            gl_band: Band::Low,
            net_carbs: 20.0,
            match_type: MatchType::Exact,
            matched_food: None,
            category: GiCategory::Other,
            confidence,
            relevant: true,
            serving_grams: 100.0,
        }
    }

    #[test]
    fn nutri_score_points_for_cola_and_lentils() {
        let cola = NutritionRecord {
            calories: 42.0,
            sugar: 10.6,
            sodium: 4.0,
            ..Default::default()
        };
        // 175.7 kJ -> 6, 10.6 g sugar -> 8
        assert_eq!(nutri_score_points(&cola, None, true), 14);

        let lentils = NutritionRecord {
            calories: 116.0,
            protein: 9.0,
            fiber: 7.9,
            sugar: 1.8,
            sodium: 2.0,
            ..Default::default()
        };
        assert_eq!(nutri_score_points(&lentils, Some("legume"), false), 1 - 5 - 5 - 5);
    }

    #[test]
    fn score_mapping_lands_on_grade_thresholds() {
        assert_eq!(nutri_score_to_score(-1, false), 85);
        assert_eq!(nutri_score_to_score(-15, false), 100);
        assert_eq!(nutri_score_to_score(0, false), 84);
        assert_eq!(nutri_score_to_score(2, false), 70);
        assert_eq!(nutri_score_to_score(3, false), 69);
        assert_eq!(nutri_score_to_score(10, false), 55);
        assert_eq!(nutri_score_to_score(11, false), 54);
        assert_eq!(nutri_score_to_score(18, false), 40);
        assert_eq!(nutri_score_to_score(19, false), 39);
        assert_eq!(nutri_score_to_score(40, false), 0);
        assert_eq!(nutri_score_to_score(10, true), 39);
    }

    #[test]
    fn gi_adjustment_ranges() {
        assert_eq!(gi_adjustment(&gi(0.0, 0.95)), Some(15.0));
        assert_eq!(gi_adjustment(&gi(55.0, 0.95)), Some(5.0));
        assert_eq!(gi_adjustment(&gi(56.0, 0.95)), Some(5.0));
        assert_eq!(gi_adjustment(&gi(69.0, 0.95)), Some(-5.0));
        assert_eq!(gi_adjustment(&gi(70.0, 0.95)), Some(-5.0));
        assert_eq!(gi_adjustment(&gi(100.0, 0.95)), Some(-15.0));
        assert_eq!(gi_adjustment(&gi(40.0, 0.59)), None);
    }

    #[test]
    fn satiety_estimates_water_when_missing() {
        let chicken = NutritionRecord {
            calories: 165.0,
            protein: 31.0,
            fat: 3.6,
            ..Default::default()
        };
        // protein 75% of energy caps at 40, water 65.4 g -> 19.6
        assert_eq!(satiety_score(&chicken), 60);
    }

    #[test]
    fn omega3_and_fibre_pull_inflammation_down() {
        let salmon = NutritionRecord {
            omega3: 2.3,
            saturated_fat: 1.0,
            ..Default::default()
        };
        assert!(inflammatory_index(&salmon) <= -0.5);
        let donut = NutritionRecord {
            saturated_fat: 10.0,
            trans_fat: 0.5,
            sugar: 25.0,
            sodium: 300.0,
            ..Default::default()
        };
        assert!(inflammatory_index(&donut) > 0.7);
    }
}
