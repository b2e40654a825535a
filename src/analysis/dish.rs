//! `dish` mode: one plated dish.

use super::common::{AllergenFlags, HealthRating, Ingredient, NutritionProfile, RecipeSteps, Status};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DishCategory {
    Appetizer,
    Main,
    Dessert,
    Beverage,
    Snack,
    Side,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishAnalysis {
    pub status: Status,
    pub data: DishData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishData {
    pub dish: DishIdentity,
    pub ingredients: Vec<Ingredient>,
    pub nutrition: NutritionProfile,
    pub allergens: AllergenFlags,
    pub health: HealthRating,
    pub recipe: RecipeSteps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishIdentity {
    pub name: String,
    pub cuisine: String,
    pub category: DishCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooking_method: Option<String>,
}
