use serde::{Deserialize, Serialize};

/// Every numeric field carried by a [`NutritionRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Calories,
    Protein,
    Carbs,
    Fat,
    Fiber,
    Sugar,
    AddedSugar,
    SaturatedFat,
    TransFat,
    MonounsaturatedFat,
    PolyunsaturatedFat,
    Omega3,
    Cholesterol,
    Sodium,
    Potassium,
    Calcium,
    Iron,
    Magnesium,
    Phosphorus,
    Zinc,
    Copper,
    Manganese,
    Selenium,
    VitaminA,
    VitaminC,
    VitaminD,
    VitaminE,
    VitaminK,
    Thiamin,
    Riboflavin,
    Niacin,
    VitaminB6,
    Folate,
    VitaminB12,
    Water,
}

impl Nutrient {
    pub const ALL: [Nutrient; 35] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbs,
        Nutrient::Fat,
        Nutrient::Fiber,
        Nutrient::Sugar,
        Nutrient::AddedSugar,
        Nutrient::SaturatedFat,
        Nutrient::TransFat,
        Nutrient::MonounsaturatedFat,
        Nutrient::PolyunsaturatedFat,
        Nutrient::Omega3,
        Nutrient::Cholesterol,
        Nutrient::Sodium,
        Nutrient::Potassium,
        Nutrient::Calcium,
        Nutrient::Iron,
        Nutrient::Magnesium,
        Nutrient::Phosphorus,
        Nutrient::Zinc,
        Nutrient::Copper,
        Nutrient::Manganese,
        Nutrient::Selenium,
        Nutrient::VitaminA,
        Nutrient::VitaminC,
        Nutrient::VitaminD,
        Nutrient::VitaminE,
        Nutrient::VitaminK,
        Nutrient::Thiamin,
        Nutrient::Riboflavin,
        Nutrient::Niacin,
        Nutrient::VitaminB6,
        Nutrient::Folate,
        Nutrient::VitaminB12,
        Nutrient::Water,
    ];

    /// Fields taken from a label database when merging with a generic
    /// database entry; the label panel is usually more accurate for these.
    pub const LABEL_MACROS: [Nutrient; 10] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbs,
        Nutrient::Fat,
        Nutrient::Fiber,
        Nutrient::Sugar,
        Nutrient::AddedSugar,
        Nutrient::SaturatedFat,
        Nutrient::TransFat,
        Nutrient::Sodium,
    ];

    pub fn is_label_macro(self) -> bool {
        Self::LABEL_MACROS.contains(&self)
    }
}

/// Per-serving nutrition. Units: kcal, g for macros and water, mg for
/// cholesterol and most minerals, µg for selenium, vitamins A/D/K, folate
/// and B12, mg for the remaining vitamins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionRecord {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub added_sugar: f64,
    pub saturated_fat: f64,
    pub trans_fat: f64,
    pub monounsaturated_fat: f64,
    pub polyunsaturated_fat: f64,
    pub omega3: f64,
    pub cholesterol: f64,
    pub sodium: f64,
    pub potassium: f64,
    pub calcium: f64,
    pub iron: f64,
    pub magnesium: f64,
    pub phosphorus: f64,
    pub zinc: f64,
    pub copper: f64,
    pub manganese: f64,
    pub selenium: f64,
    pub vitamin_a: f64,
    pub vitamin_c: f64,
    pub vitamin_d: f64,
    pub vitamin_e: f64,
    pub vitamin_k: f64,
    pub thiamin: f64,
    pub riboflavin: f64,
    pub niacin: f64,
    pub vitamin_b6: f64,
    pub folate: f64,
    pub vitamin_b12: f64,
    pub water: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycemic_index: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glycemic_load: Option<f64>,
}

impl NutritionRecord {
    pub fn get(&self, n: Nutrient) -> f64 {
        match n {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
            Nutrient::Fat => self.fat,
            Nutrient::Fiber => self.fiber,
            Nutrient::Sugar => self.sugar,
            Nutrient::AddedSugar => self.added_sugar,
            Nutrient::SaturatedFat => self.saturated_fat,
            Nutrient::TransFat => self.trans_fat,
            Nutrient::MonounsaturatedFat => self.monounsaturated_fat,
            Nutrient::PolyunsaturatedFat => self.polyunsaturated_fat,
            Nutrient::Omega3 => self.omega3,
            Nutrient::Cholesterol => self.cholesterol,
            Nutrient::Sodium => self.sodium,
            Nutrient::Potassium => self.potassium,
            Nutrient::Calcium => self.calcium,
            Nutrient::Iron => self.iron,
            Nutrient::Magnesium => self.magnesium,
            Nutrient::Phosphorus => self.phosphorus,
            Nutrient::Zinc => self.zinc,
            Nutrient::Copper => self.copper,
            Nutrient::Manganese => self.manganese,
            Nutrient::Selenium => self.selenium,
            Nutrient::VitaminA => self.vitamin_a,
            Nutrient::VitaminC => self.vitamin_c,
            Nutrient::VitaminD => self.vitamin_d,
            Nutrient::VitaminE => self.vitamin_e,
            Nutrient::VitaminK => self.vitamin_k,
            Nutrient::Thiamin => self.thiamin,
            Nutrient::Riboflavin => self.riboflavin,
            Nutrient::Niacin => self.niacin,
            Nutrient::VitaminB6 => self.vitamin_b6,
            Nutrient::Folate => self.folate,
            Nutrient::VitaminB12 => self.vitamin_b12,
            Nutrient::Water => self.water,
        }
    }

    pub fn get_mut(&mut self, n: Nutrient) -> &mut f64 {
        match n {
            Nutrient::Calories => &mut self.calories,
            Nutrient::Protein => &mut self.protein,
            Nutrient::Carbs => &mut self.carbs,
            Nutrient::Fat => &mut self.fat,
            Nutrient::Fiber => &mut self.fiber,
            Nutrient::Sugar => &mut self.sugar,
            Nutrient::AddedSugar => &mut self.added_sugar,
            Nutrient::SaturatedFat => &mut self.saturated_fat,
            Nutrient::TransFat => &mut self.trans_fat,
            Nutrient::MonounsaturatedFat => &mut self.monounsaturated_fat,
            Nutrient::PolyunsaturatedFat => &mut self.polyunsaturated_fat,
            Nutrient::Omega3 => &mut self.omega3,
            Nutrient::Cholesterol => &mut self.cholesterol,
            Nutrient::Sodium => &mut self.sodium,
            Nutrient::Potassium => &mut self.potassium,
            Nutrient::Calcium => &mut self.calcium,
            Nutrient::Iron => &mut self.iron,
            Nutrient::Magnesium => &mut self.magnesium,
            Nutrient::Phosphorus => &mut self.phosphorus,
            Nutrient::Zinc => &mut self.zinc,
            Nutrient::Copper => &mut self.copper,
            Nutrient::Manganese => &mut self.manganese,
            Nutrient::Selenium => &mut self.selenium,
            Nutrient::VitaminA => &mut self.vitamin_a,
            Nutrient::VitaminC => &mut self.vitamin_c,
            Nutrient::VitaminD => &mut self.vitamin_d,
            Nutrient::VitaminE => &mut self.vitamin_e,
            Nutrient::VitaminK => &mut self.vitamin_k,
            Nutrient::Thiamin => &mut self.thiamin,
            Nutrient::Riboflavin => &mut self.riboflavin,
            Nutrient::Niacin => &mut self.niacin,
            Nutrient::VitaminB6 => &mut self.vitamin_b6,
            Nutrient::Folate => &mut self.folate,
            Nutrient::VitaminB12 => &mut self.vitamin_b12,
            Nutrient::Water => &mut self.water,
        }
    }

    pub fn set(&mut self, n: Nutrient, value: f64) {
        *self.get_mut(n) = value;
    }

    /// Linear rescale from one serving size to another. Unrounded.
    pub fn scaled(&self, from_grams: f64, to_grams: f64) -> Self {
        if from_grams <= 0.0 || !from_grams.is_finite() {
            return self.clone();
        }
        let factor = to_grams / from_grams;
        let mut out = self.clone();
        for n in Nutrient::ALL {
            *out.get_mut(n) *= factor;
        }
        // glycemic fields belong to a specific serving and are re-derived
        out.glycemic_index = None;
        out.glycemic_load = None;
        out
    }

    pub fn add_assign(&mut self, other: &NutritionRecord) {
        for n in Nutrient::ALL {
            *self.get_mut(n) += other.get(n);
        }
    }

    /// Field-wise total of many records, rounded with the shared policy.
    pub fn sum<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a NutritionRecord>,
    {
        let mut total = NutritionRecord::default();
        for r in records {
            total.add_assign(r);
        }
        total.rounded()
    }

    pub fn net_carbs(&self) -> f64 {
        (self.carbs - self.fiber).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        Nutrient::ALL.iter().all(|n| self.get(*n) == 0.0)
    }

    /// Count of nutrients with a non-zero value; used as a completeness signal.
    pub fn populated_fields(&self) -> usize {
        Nutrient::ALL.iter().filter(|n| self.get(**n) > 0.0).count()
    }
}
