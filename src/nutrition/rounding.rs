use super::record::{Nutrient, NutritionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Whole,
    OneDecimal,
    TwoDecimals,
}

/// Single rounding table shared by every source client, the resolver and
/// meal totals.
pub fn precision(n: Nutrient) -> Precision {
    match n {
        Nutrient::Calories
        | Nutrient::Sodium
        | Nutrient::Potassium
        | Nutrient::Calcium
        | Nutrient::Cholesterol
        | Nutrient::Phosphorus
        | Nutrient::Magnesium => Precision::Whole,
        Nutrient::Thiamin
        | Nutrient::Riboflavin
        | Nutrient::VitaminB6
        | Nutrient::VitaminB12
        | Nutrient::Copper
        | Nutrient::Manganese => Precision::TwoDecimals,
        _ => Precision::OneDecimal,
    }
}

pub fn round_to(value: f64, precision: Precision) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    match precision {
        Precision::Whole => value.round(),
        Precision::OneDecimal => (value * 10.0).round() / 10.0,
        Precision::TwoDecimals => (value * 100.0).round() / 100.0,
    }
}

pub fn round_nutrient(n: Nutrient, value: f64) -> f64 {
    round_to(value, precision(n))
}

impl NutritionRecord {
    pub fn rounded(&self) -> Self {
        let mut out = self.clone();
        for n in Nutrient::ALL {
            let v = round_nutrient(n, out.get(n));
            // negative values only show up from bad upstream data
            out.set(n, v.max(0.0));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_unit_nutrients() {
        assert_eq!(round_nutrient(Nutrient::Calories, 280.5), 281.0);
        assert_eq!(round_nutrient(Nutrient::Sodium, 125.4), 125.0);
        assert_eq!(round_nutrient(Nutrient::Magnesium, 31.6), 32.0);
    }

    #[test]
    fn trace_nutrients_keep_two_decimals() {
        assert_eq!(round_nutrient(Nutrient::VitaminB12, 0.456), 0.46);
        assert_eq!(round_nutrient(Nutrient::Copper, 0.044), 0.04);
    }

    #[test]
    fn everything_else_one_decimal() {
        assert_eq!(round_nutrient(Nutrient::Protein, 30.96), 31.0);
        assert_eq!(round_nutrient(Nutrient::Iron, 1.04), 1.0);
        assert_eq!(round_nutrient(Nutrient::VitaminC, 12.36), 12.4);
    }

    #[test]
    fn non_finite_and_negative_values_are_zeroed() {
        let r = NutritionRecord {
            calories: f64::NAN,
            fat: -2.0,
            ..Default::default()
        }
        .rounded();
        assert_eq!(r.calories, 0.0);
        assert_eq!(r.fat, 0.0);
    }
}
