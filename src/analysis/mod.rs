//! Validated output records, one shape per [`AnalysisMode`].
//!
//! Field names on the wire are camelCase so the JSON a caller receives is
//! exactly the JSON the schema in [`crate::schema`] describes. Records are
//! built once, after validation, and never mutated afterwards.

pub mod common;
pub mod dish;
pub mod fridge;
pub mod recipe;

pub use common::{
    AllergenFlags, DietaryLabel, Difficulty, HealthRating, Ingredient, IngredientCategory,
    NutritionProfile, RecipeSteps, Status, VitaminNotes,
};
pub use dish::{DishAnalysis, DishCategory, DishData, DishIdentity};
pub use fridge::{
    BalanceAssessment, FridgeAnalysis, FridgeData, Freshness, PantryCategory, PantryItem,
    RecipeIngredient, SuggestedRecipe, SUGGESTED_RECIPE_COUNT,
};
pub use recipe::{RecipeAnalysis, RecipeData, RecipeMetadata};

use crate::mode::AnalysisMode;
use serde::Serialize;

/// A validated record, tagged by the mode that produced it.
///
/// Serialises untagged: the body is the mode's own shape, with `status`
/// as its discriminant field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredAnalysis {
    Dish(DishAnalysis),
    Fridge(FridgeAnalysis),
    Recipe(RecipeAnalysis),
}

impl StructuredAnalysis {
    /// Deserialise an already schema-checked value into the mode's record.
    ///
    /// The error carries the path of the field that failed.
    pub(crate) fn from_value(
        mode: AnalysisMode,
        value: serde_json::Value,
    ) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
        Ok(match mode {
            AnalysisMode::Dish => StructuredAnalysis::Dish(serde_path_to_error::deserialize(value)?),
            AnalysisMode::Fridge => {
                StructuredAnalysis::Fridge(serde_path_to_error::deserialize(value)?)
            }
            AnalysisMode::Recipe => {
                StructuredAnalysis::Recipe(serde_path_to_error::deserialize(value)?)
            }
        })
    }

    pub fn mode(&self) -> AnalysisMode {
        match self {
            StructuredAnalysis::Dish(_) => AnalysisMode::Dish,
            StructuredAnalysis::Fridge(_) => AnalysisMode::Fridge,
            StructuredAnalysis::Recipe(_) => AnalysisMode::Recipe,
        }
    }

    pub fn as_dish(&self) -> Option<&DishAnalysis> {
        match self {
            StructuredAnalysis::Dish(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_fridge(&self) -> Option<&FridgeAnalysis> {
        match self {
            StructuredAnalysis::Fridge(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_recipe(&self) -> Option<&RecipeAnalysis> {
        match self {
            StructuredAnalysis::Recipe(r) => Some(r),
            _ => None,
        }
    }

    /// Allergen block, when the mode has one.
    pub fn allergens(&self) -> Option<&AllergenFlags> {
        match self {
            StructuredAnalysis::Dish(d) => Some(&d.data.allergens),
            StructuredAnalysis::Fridge(f) => Some(&f.data.allergens),
            StructuredAnalysis::Recipe(r) => r.data.allergens.as_ref(),
        }
    }

    /// Short human label for logs: dish name, recipe name, or item count.
    pub fn summary(&self) -> String {
        match self {
            StructuredAnalysis::Dish(d) => d.data.dish.name.clone(),
            StructuredAnalysis::Fridge(f) => format!("{} items", f.data.ingredients.len()),
            StructuredAnalysis::Recipe(r) => r.data.recipe_name.clone(),
        }
    }
}
