//! `recipe` mode: a transcribed recipe card, page or screen.

use super::common::{AllergenFlags, Difficulty, HealthRating, NutritionProfile, Status};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeAnalysis {
    pub status: Status,
    pub data: RecipeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeData {
    pub recipe_name: String,
    /// Ingredient lines exactly as written.
    pub ingredients: Vec<String>,
    /// Instruction steps exactly as written, in order.
    pub instructions: Vec<String>,
    pub metadata: RecipeMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergens: Option<AllergenFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthRating>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}
