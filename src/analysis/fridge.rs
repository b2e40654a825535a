//! `fridge` mode: inventory of a fridge or pantry plus three meal ideas.

use super::common::{AllergenFlags, Difficulty, NutritionProfile, Status};
use serde::{Deserialize, Serialize};

/// How many meal suggestions every fridge analysis carries.
pub const SUGGESTED_RECIPE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PantryCategory {
    Protein,
    Vegetable,
    Fruit,
    Dairy,
    Grain,
    Condiment,
    Beverage,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Freshness {
    Fresh,
    Good,
    UseSoon,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FridgeAnalysis {
    pub status: Status,
    pub data: FridgeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FridgeData {
    pub ingredients: Vec<PantryItem>,
    /// Allergens present among the fridge contents.
    pub allergens: AllergenFlags,
    pub nutrition_assessment: BalanceAssessment,
    pub suggested_recipes: [SuggestedRecipe; SUGGESTED_RECIPE_COUNT],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopping_list: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryItem {
    pub name: String,
    pub category: PantryCategory,
    pub freshness: Freshness,
    pub confidence: f64,
    /// e.g. "half full", "3 eggs"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    /// e.g. "top shelf", "door"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl PantryItem {
    pub fn needs_attention(&self) -> bool {
        matches!(self.freshness, Freshness::UseSoon | Freshness::Expired)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAssessment {
    pub has_proteins: bool,
    pub has_vegetables: bool,
    pub has_fruits: bool,
    pub has_whole_grains: bool,
    /// `[1, 10]`
    pub balance_score: u8,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedRecipe {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Vec<String>,
    pub prep_time: u32,
    pub cook_time: u32,
    pub servings: u32,
    pub difficulty: Difficulty,
    pub kid_friendly: u8,
    /// Why kids will like it.
    pub kid_appeal: String,
    pub health_score: u8,
    pub nutrition: NutritionProfile,
}

impl SuggestedRecipe {
    /// Ingredients the recipe needs that are not in the fridge.
    pub fn missing_ingredients(&self) -> impl Iterator<Item = &RecipeIngredient> {
        self.ingredients.iter().filter(|i| !i.available)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    pub amount: String,
    /// Whether the ingredient was seen in the fridge.
    pub available: bool,
}
