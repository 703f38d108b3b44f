use super::scores::{inflammatory_index, protein_energy_pct, to_score};
use super::types::{FocusScore, Grade, WellnessFocus};
use crate::nutrition::{Nutrient, NutritionRecord};

const BASE_SCORE: f64 = 50.0;

const MICRONUTRIENTS: [Nutrient; 14] = [
    Nutrient::Potassium,
    Nutrient::Calcium,
    Nutrient::Iron,
    Nutrient::Magnesium,
    Nutrient::Zinc,
    Nutrient::Selenium,
    Nutrient::VitaminA,
    Nutrient::VitaminC,
    Nutrient::VitaminD,
    Nutrient::VitaminE,
    Nutrient::VitaminK,
    Nutrient::Folate,
    Nutrient::VitaminB6,
    Nutrient::VitaminB12,
];

/// Accumulates points and the reasons for them.
struct Scorecard {
    score: f64,
    pros: Vec<String>,
    cons: Vec<String>,
}

impl Scorecard {
    fn new() -> Self {
        Self {
            score: BASE_SCORE,
            pros: Vec::new(),
            cons: Vec::new(),
        }
    }

    fn reward(&mut self, when: bool, points: f64, why: &str) -> &mut Self {
        if when {
            self.score += points;
            self.pros.push(why.to_string());
        }
        self
    }

    fn penalize(&mut self, when: bool, points: f64, why: &str) -> &mut Self {
        if when {
            self.score -= points;
            self.cons.push(why.to_string());
        }
        self
    }

    fn finish(self, focus: WellnessFocus) -> FocusScore {
        let score = to_score(self.score);
        FocusScore {
            focus,
            score,
            grade: Grade::from_score(score),
            insight: insight(focus, score, &self.pros, &self.cons),
            pros: self.pros,
            cons: self.cons,
        }
    }
}

fn insight(focus: WellnessFocus, score: u8, pros: &[String], cons: &[String]) -> String {
    let verdict = match Grade::from_score(score) {
        Grade::A => "An excellent choice",
        Grade::B => "A good choice",
        Grade::C => "A reasonable choice",
        Grade::D => "A weak choice",
        Grade::F => "A poor choice",
    };
    match (pros.first(), cons.first()) {
        (Some(p), Some(c)) => format!("{verdict} for {}: {}, but {}.", focus.label(), p.to_lowercase(), c.to_lowercase()),
        (Some(p), None) => format!("{verdict} for {}: {}.", focus.label(), p.to_lowercase()),
        (None, Some(c)) => format!("{verdict} for {}: {}.", focus.label(), c.to_lowercase()),
        (None, None) => format!("{verdict} for {}.", focus.label()),
    }
}

/// Scores one focus from a per-100 g record.
pub(crate) fn score_focus(focus: WellnessFocus, n: &NutritionRecord) -> FocusScore {
    let mut card = Scorecard::new();
    let protein_pct = protein_energy_pct(n);
    let unsaturated = n.monounsaturated_fat + n.polyunsaturated_fat;
    let micros = MICRONUTRIENTS.iter().filter(|m| n.get(**m) > 0.0).count();

    match focus {
        WellnessFocus::Balanced => {
            card.reward((15.0..=35.0).contains(&protein_pct), 10.0, "Good protein share")
                .reward(n.fiber >= 3.0, 10.0, "Good source of fibre")
                .reward(n.sugar <= 5.0, 5.0, "Low in sugar")
                .penalize(n.sugar > 15.0, 15.0, "High in sugar")
                .reward(n.saturated_fat <= 1.5, 5.0, "Low in saturated fat")
                .penalize(n.saturated_fat > 5.0, 10.0, "High in saturated fat")
                .reward(n.sodium <= 120.0, 5.0, "Low in sodium")
                .penalize(n.sodium > 600.0, 10.0, "High in sodium")
                .reward(micros >= 8, 10.0, "Broad micronutrient coverage");
        }
        WellnessFocus::MuscleBuilding => {
            card.reward(n.protein >= 20.0, 25.0, "Excellent protein source")
                .reward((10.0..20.0).contains(&n.protein), 10.0, "Good protein source")
                .penalize(n.protein < 5.0, 15.0, "Low in protein")
                .reward(protein_pct >= 30.0, 10.0, "Protein-dense calories")
                .reward(n.carbs >= 15.0, 5.0, "Carbohydrate to refuel")
                .penalize(n.sugar > 20.0, 10.0, "High in sugar");
        }
        WellnessFocus::HeartHealth => {
            card.penalize(n.saturated_fat > 5.0, 20.0, "High in saturated fat")
                .reward(n.saturated_fat <= 1.5, 10.0, "Low in saturated fat")
                .penalize(n.trans_fat > 0.2, 15.0, "Contains trans fat")
                .penalize(n.sodium > 600.0, 20.0, "High in sodium")
                .reward(n.sodium <= 120.0, 10.0, "Low in sodium")
                .reward(n.fiber >= 3.0, 10.0, "Good source of fibre")
                .reward(n.potassium >= 300.0, 10.0, "Good source of potassium")
                .reward(unsaturated >= 3.0 && unsaturated > n.saturated_fat * 2.0, 10.0, "Mostly unsaturated fats")
                .reward(n.omega3 >= 0.5, 5.0, "Source of omega-3")
                .penalize(n.cholesterol > 100.0, 5.0, "High in cholesterol");
        }
        WellnessFocus::EnergyEndurance => {
            card.reward(n.carbs >= 20.0, 10.0, "Carbohydrate for fuel")
                .reward(n.fiber >= 3.0, 5.0, "Fibre for steady release")
                .penalize(n.sugar > 20.0, 10.0, "Sugar spike risk")
                .reward(n.iron >= 2.0, 10.0, "Iron supports oxygen transport")
                .reward(
                    n.thiamin >= 0.2 || n.vitamin_b6 >= 0.3 || n.vitamin_b12 >= 0.5,
                    10.0,
                    "B vitamins for energy metabolism",
                )
                .reward(n.protein >= 10.0, 5.0, "Protein for recovery");
        }
        WellnessFocus::WeightManagement => {
            card.reward(n.calories > 0.0 && n.calories <= 150.0, 15.0, "Low energy density")
                .penalize(n.calories > 400.0, 20.0, "Energy dense")
                .reward(n.protein >= 10.0, 10.0, "Protein supports fullness")
                .reward(n.fiber >= 3.0, 10.0, "Fibre supports fullness")
                .penalize(n.sugar > 15.0, 10.0, "High in sugar")
                .penalize(n.added_sugar > 5.0, 5.0, "Contains added sugar")
                .penalize(n.fat > 20.0, 10.0, "High in fat");
        }
        WellnessFocus::BrainFocus => {
            card.reward(n.omega3 >= 0.5, 20.0, "Source of omega-3")
                .reward(n.vitamin_b12 >= 0.5 || n.folate >= 40.0, 10.0, "Provides B12 or folate")
                .reward(n.vitamin_e >= 2.0, 5.0, "Source of vitamin E")
                .reward(n.iron >= 2.0, 5.0, "Source of iron")
                .penalize(n.sugar > 20.0, 15.0, "Sugar crash risk")
                .penalize(n.saturated_fat > 5.0, 10.0, "High in saturated fat");
        }
        WellnessFocus::GutHealth => {
            card.reward(n.fiber >= 6.0, 35.0, "High in fibre")
                .reward((3.0..6.0).contains(&n.fiber), 20.0, "Source of fibre")
                .penalize(n.fiber < 1.0, 20.0, "Little to no fibre")
                .penalize(n.added_sugar > 10.0, 10.0, "High in added sugar");
        }
        WellnessFocus::BloodSugarBalance => {
            let net = n.net_carbs();
            card.reward(n.fiber >= 3.0, 10.0, "Fibre slows absorption")
                .reward(n.sugar <= 5.0, 10.0, "Low in sugar")
                .penalize(n.sugar > 15.0, 20.0, "High in sugar")
                .reward(net <= 10.0, 10.0, "Low in net carbs")
                .penalize(net > 40.0, 10.0, "High in net carbs")
                .reward(n.protein >= 10.0, 5.0, "Protein slows absorption");
        }
        WellnessFocus::BoneJointSupport => {
            card.reward(n.calcium >= 120.0, 20.0, "Good source of calcium")
                .reward(n.vitamin_d >= 1.5, 10.0, "Source of vitamin D")
                .reward(n.vitamin_k >= 15.0, 5.0, "Source of vitamin K")
                .reward(n.magnesium >= 60.0, 5.0, "Source of magnesium")
                .reward(n.phosphorus >= 100.0, 5.0, "Source of phosphorus")
                .reward(n.protein >= 10.0, 5.0, "Protein for connective tissue")
                .reward(n.omega3 >= 0.5, 5.0, "Omega-3 for joints")
                .penalize(n.sodium > 600.0, 10.0, "High in sodium");
        }
        WellnessFocus::AntiInflammatory => {
            let index = inflammatory_index(n);
            card.score -= index * 25.0;
            card.reward(n.omega3 >= 0.5, 0.0, "Source of omega-3")
                .reward(n.fiber >= 3.0, 0.0, "Good source of fibre")
                .reward(n.vitamin_c >= 20.0, 0.0, "Rich in vitamin C")
                .penalize(n.saturated_fat > 5.0, 0.0, "High in saturated fat")
                .penalize(n.trans_fat > 0.2, 0.0, "Contains trans fat")
                .penalize(n.sugar > 15.0, 0.0, "High in sugar");
        }
    }
    card.finish(focus)
}

/// Shifts a focus score by `points` and re-derives its grade.
pub(crate) fn adjust(score: &mut FocusScore, points: f64, note: String) {
    score.score = to_score(f64::from(score.score) + points);
    score.grade = Grade::from_score(score.score);
    if points >= 0.0 {
        score.pros.push(note);
    } else {
        score.cons.push(note);
    }
}
