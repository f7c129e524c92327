use lazy_static::lazy_static;
use regex::Regex;

use crate::recipes::repo_types::{Ingredient, NutritionTotals};

/// Assumed quantity when the quantity string has no leading number.
pub const DEFAULT_QUANTITY: f64 = 100.0;

/// Leading numeric run of a quantity string: `"200g"` -> 200, `"1.5 cups"` -> 1.5.
pub fn parse_quantity(raw: &str) -> f64 {
    lazy_static! {
        static ref LEADING_NUMBER: Regex = Regex::new(r"^\s*(\d+(?:\.\d*)?|\.\d+)").unwrap();
    }
    LEADING_NUMBER
        .captures(raw)
        .and_then(|c| c[1].parse::<f64>().ok())
        .unwrap_or(DEFAULT_QUANTITY)
}

/// Sums unrounded, then rounds each total to 2 decimals.
pub fn compute_totals(ingredients: &[Ingredient]) -> NutritionTotals {
    let sum = ingredients.iter().fold(NutritionTotals::default(), |mut acc, ing| {
        let factor = parse_quantity(&ing.quantity) / 100.0;
        acc.total_calories += ing.calories.unwrap_or(0.0) * factor;
        acc.total_protein += ing.protein.unwrap_or(0.0) * factor;
        acc.total_fat += ing.fat.unwrap_or(0.0) * factor;
        acc.total_carbs += ing.carbs.unwrap_or(0.0) * factor;
        acc
    });

    NutritionTotals {
        total_calories: round2(sum.total_calories),
        total_protein: round2(sum.total_protein),
        total_fat: round2(sum.total_fat),
        total_carbs: round2(sum.total_carbs),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
