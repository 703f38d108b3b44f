use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiCategory {
    Bread,
    Cereal,
    Rice,
    Pasta,
    Grain,
    Legume,
    Vegetable,
    Fruit,
    Dairy,
    Beverage,
    Snack,
    Sweetener,
    MixedMeal,
    Other,
}

impl GiCategory {
    pub fn default_gi(self) -> f64 {
        match self {
            GiCategory::Bread => 70.0,
            GiCategory::Cereal => 66.0,
            GiCategory::Rice => 68.0,
            GiCategory::Pasta => 50.0,
            GiCategory::Grain => 55.0,
            GiCategory::Legume => 32.0,
            GiCategory::Vegetable => 40.0,
            GiCategory::Fruit => 45.0,
            GiCategory::Dairy => 35.0,
            GiCategory::Beverage => 50.0,
            GiCategory::Snack => 60.0,
            GiCategory::Sweetener => 65.0,
            GiCategory::MixedMeal => 55.0,
            GiCategory::Other => 50.0,
        }
    }
}

/// How well established a reference value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryQuality {
    High,
    Medium,
    Low,
}

impl EntryQuality {
    pub fn base_confidence(self) -> f64 {
        match self {
            EntryQuality::High => 0.95,
            EntryQuality::Medium => 0.80,
            EntryQuality::Low => 0.65,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GiEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub gi: f64,
    pub category: GiCategory,
    pub quality: EntryQuality,
}

const fn entry(
    name: &'static str,
    aliases: &'static [&'static str],
    gi: f64,
    category: GiCategory,
    quality: EntryQuality,
) -> GiEntry {
    GiEntry {
        name,
        aliases,
        gi,
        category,
        quality,
    }
}

use EntryQuality::{High, Low, Medium};
use GiCategory::*;

/// Reference values (glucose = 100), names already normalized.
pub static REFERENCE_TABLE: &[GiEntry] = &[
    // bread
    entry("white bread", &["white toast", "sandwich bread", "toast"], 75.0, Bread, High),
    entry("whole wheat bread", &["wholemeal bread", "whole grain bread", "brown bread"], 74.0, Bread, High),
    entry("sourdough bread", &["sourdough"], 54.0, Bread, Medium),
    entry("rye bread", &["pumpernickel", "pumpernickel bread"], 58.0, Bread, Medium),
    entry("bagel", &["plain bagel"], 72.0, Bread, Medium),
    entry("croissant", &[], 67.0, Bread, Medium),
    entry("pita bread", &["pita"], 68.0, Bread, Medium),
    entry("corn tortilla", &[], 46.0, Bread, Medium),
    entry("wheat tortilla", &["flour tortilla"], 30.0, Bread, Medium),
    entry("naan", &["naan bread"], 71.0, Bread, Low),
    entry("baguette", &["french bread"], 95.0, Bread, Medium),
    // cereal
    entry("cornflakes", &["corn flakes"], 81.0, Cereal, High),
    entry("rolled oats", &["oatmeal", "porridge", "oats"], 55.0, Cereal, High),
    entry("instant oatmeal", &["instant oats", "instant porridge"], 79.0, Cereal, High),
    entry("muesli", &[], 57.0, Cereal, Medium),
    entry("granola", &[], 55.0, Cereal, Low),
    entry("bran flakes", &["bran cereal"], 74.0, Cereal, Medium),
    entry("puffed rice cereal", &["rice krispies", "rice puffs"], 82.0, Cereal, Medium),
    // rice
    entry("white rice", &["boiled white rice", "steamed rice", "jasmine rice", "cooked white rice"], 73.0, Rice, High),
    entry("brown rice", &["boiled brown rice", "cooked brown rice"], 68.0, Rice, High),
    entry("basmati rice", &["basmati"], 58.0, Rice, High),
    entry("sticky rice", &["glutinous rice"], 87.0, Rice, Medium),
    entry("rice noodles", &["rice vermicelli", "pho noodles"], 53.0, Rice, Medium),
    // pasta
    entry("spaghetti", &["white spaghetti", "boiled spaghetti", "pasta"], 49.0, Pasta, High),
    entry("whole wheat pasta", &["wholemeal pasta", "whole grain pasta"], 48.0, Pasta, High),
    entry("macaroni", &["macaroni pasta"], 47.0, Pasta, Medium),
    entry("macaroni and cheese", &["mac and cheese"], 64.0, Pasta, Medium),
    entry("udon noodles", &["udon"], 55.0, Pasta, Medium),
    entry("instant noodles", &["ramen noodles"], 47.0, Pasta, Medium),
    // grains
    entry("couscous", &[], 65.0, Grain, Medium),
    entry("quinoa", &["cooked quinoa"], 53.0, Grain, Medium),
    entry("pearl barley", &["barley"], 28.0, Grain, High),
    entry("bulgur", &["bulgur wheat", "cracked wheat"], 48.0, Grain, Medium),
    entry("buckwheat", &["kasha"], 45.0, Grain, Medium),
    entry("sweet corn", &["corn", "corn on the cob"], 52.0, Grain, Medium),
    entry("millet", &["millet porridge"], 71.0, Grain, Low),
    // legumes
    entry("lentils", &["red lentils", "green lentils", "boiled lentils"], 32.0, Legume, High),
    entry("chickpeas", &["garbanzo beans", "boiled chickpeas"], 28.0, Legume, High),
    entry("kidney beans", &["red kidney beans"], 24.0, Legume, High),
    entry("black beans", &[], 30.0, Legume, Medium),
    entry("baked beans", &[], 40.0, Legume, Medium),
    entry("soybeans", &["soya beans", "edamame"], 16.0, Legume, High),
    entry("hummus", &["houmous"], 6.0, Legume, Low),
    entry("green peas", &["peas"], 51.0, Legume, Medium),
    // vegetables and tubers
    entry("potato", &["boiled potato", "white potato"], 78.0, Vegetable, High),
    entry("mashed potatoes", &["mashed potato"], 87.0, Vegetable, High),
    entry("french fries", &["fries"], 63.0, Vegetable, Medium),
    entry("baked potato", &["jacket potato"], 85.0, Vegetable, High),
    entry("sweet potato", &["boiled sweet potato", "yam"], 63.0, Vegetable, High),
    entry("carrots", &["boiled carrots", "carrot"], 39.0, Vegetable, High),
    entry("pumpkin", &["squash"], 64.0, Vegetable, Low),
    entry("beetroot", &["beets"], 64.0, Vegetable, Medium),
    // fruit
    entry("apple", &["apples", "red apple", "green apple"], 36.0, Fruit, High),
    entry("banana", &["bananas", "ripe banana"], 51.0, Fruit, High),
    entry("orange", &["oranges"], 43.0, Fruit, High),
    entry("grapes", &["grape", "red grapes", "green grapes"], 59.0, Fruit, Medium),
    entry("mango", &[], 51.0, Fruit, Medium),
    entry("pineapple", &[], 59.0, Fruit, Medium),
    entry("watermelon", &[], 76.0, Fruit, Medium),
    entry("strawberries", &["strawberry"], 40.0, Fruit, Medium),
    entry("blueberries", &["blueberry"], 53.0, Fruit, Low),
    entry("pear", &["pears"], 38.0, Fruit, High),
    entry("peach", &["peaches"], 42.0, Fruit, Medium),
    entry("cherries", &["cherry"], 22.0, Fruit, Low),
    entry("kiwi", &["kiwifruit", "kiwi fruit"], 50.0, Fruit, Medium),
    entry("dates", &["dried dates", "medjool dates"], 42.0, Fruit, Low),
    entry("raisins", &["sultanas"], 64.0, Fruit, Medium),
    // dairy
    entry("whole milk", &["milk", "full fat milk"], 39.0, Dairy, High),
    entry("skim milk", &["skimmed milk", "nonfat milk"], 37.0, Dairy, High),
    entry("plain yogurt", &["yogurt", "natural yogurt", "yoghurt"], 41.0, Dairy, Medium),
    entry("greek yogurt", &["greek yoghurt"], 11.0, Dairy, Low),
    entry("ice cream", &["vanilla ice cream"], 51.0, Dairy, Medium),
    entry("soy milk", &["soya milk"], 34.0, Dairy, Medium),
    // beverages
    entry("orange juice", &["oj", "fresh orange juice"], 50.0, Beverage, High),
    entry("apple juice", &[], 41.0, Beverage, High),
    entry("cola", &["coca cola", "soda", "soft drink"], 63.0, Beverage, Medium),
    entry("sports drink", &["gatorade"], 78.0, Beverage, Low),
    // snacks
    entry("potato chips", &["crisps", "potato crisps", "chips"], 56.0, Snack, Medium),
    entry("popcorn", &["air popped popcorn"], 65.0, Snack, Medium),
    entry("pretzels", &["pretzel"], 83.0, Snack, Medium),
    entry("rice cakes", &["rice cake", "puffed rice cakes"], 82.0, Snack, Medium),
    entry("crackers", &["saltine crackers", "water crackers"], 74.0, Snack, Low),
    entry("dark chocolate", &["dark chocolate bar"], 23.0, Snack, Low),
    entry("milk chocolate", &["chocolate bar"], 43.0, Snack, Medium),
    entry("doughnut", &["donut"], 76.0, Snack, Medium),
    entry("muffin", &["blueberry muffin"], 60.0, Snack, Low),
    entry("sponge cake", &["cake"], 46.0, Snack, Low),
    // sweeteners
    entry("table sugar", &["sugar", "sucrose", "white sugar"], 65.0, Sweetener, High),
    entry("honey", &[], 61.0, Sweetener, Medium),
    entry("maple syrup", &[], 54.0, Sweetener, Low),
    entry("glucose", &["dextrose"], 100.0, Sweetener, High),
    entry("fructose", &[], 15.0, Sweetener, High),
    // mixed meals
    entry("pizza", &["cheese pizza", "pizza margherita"], 60.0, MixedMeal, Medium),
    entry("hamburger", &["burger"], 66.0, MixedMeal, Low),
    entry("sushi", &["sushi roll"], 55.0, MixedMeal, Medium),
    entry("lentil soup", &[], 44.0, MixedMeal, Low),
];

/// Name keywords per category, checked in this order.
pub(crate) static CATEGORY_KEYWORDS: &[(GiCategory, &[&str])] = &[
    (MixedMeal, &["pizza", "burger", "sandwich", "burrito", "taco", "stew", "curry", "soup", "casserole", "wrap", "lasagna", "stir"]),
    (Beverage, &["juice", "soda", "cola", "smoothie", "latte", "coffee", "tea", "drink", "lemonade", "shake"]),
    (Sweetener, &["sugar", "honey", "syrup", "jam", "agave", "molasses"]),
    (Snack, &["chip", "crisp", "cracker", "cookie", "pretzel", "popcorn", "bar", "cake", "muffin", "donut", "doughnut", "candy", "chocolate", "biscuit"]),
    (Bread, &["bread", "toast", "bagel", "baguette", "bun", "roll", "croissant", "pita", "tortilla", "naan", "brioche"]),
    (Cereal, &["cereal", "cornflake", "granola", "muesli", "oatmeal", "porridge", "flake"]),
    (Rice, &["rice", "risotto", "pilaf", "paella"]),
    (Pasta, &["pasta", "spaghetti", "macaroni", "noodle", "penne", "fettuccine", "linguine", "ravioli", "gnocchi"]),
    (Grain, &["quinoa", "couscous", "barley", "bulgur", "millet", "oat", "corn", "buckwheat", "polenta", "farro"]),
    (Legume, &["bean", "lentil", "chickpea", "pea", "hummus", "tofu", "soy", "edamame", "dal"]),
    (Dairy, &["milk", "yogurt", "yoghurt", "cheese", "kefir", "cream", "custard"]),
    (Fruit, &["fruit", "apple", "banana", "orange", "grape", "berry", "berries", "mango", "pineapple", "pear", "peach", "melon", "cherry", "cherries", "kiwi", "plum", "apricot", "fig"]),
    (Vegetable, &["vegetable", "salad", "broccoli", "spinach", "carrot", "tomato", "pepper", "kale", "cabbage", "cauliflower", "zucchini", "lettuce", "cucumber", "onion", "mushroom", "potato", "squash"]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::normalize_name;

    #[test]
    fn names_and_aliases_are_normalized_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for e in REFERENCE_TABLE {
            assert_eq!(normalize_name(e.name), e.name);
            assert!(seen.insert(e.name), "duplicate {}", e.name);
            for a in e.aliases {
                assert_eq!(normalize_name(a), *a);
            }
            assert!((0.0..=100.0).contains(&e.gi));
        }
        assert!(REFERENCE_TABLE.len() >= 80);
    }
}
