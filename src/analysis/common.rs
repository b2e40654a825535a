//! Sub-structures shared by more than one mode.

use serde::{Deserialize, Serialize};

/// Discriminant present on every validated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "success")]
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Food group of an ingredient detected on a plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientCategory {
    Protein,
    Vegetable,
    Fruit,
    Grain,
    Dairy,
    Fat,
    Seasoning,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietaryLabel {
    Vegetarian,
    Vegan,
    GlutenFree,
    DairyFree,
    LowCarb,
    HighProtein,
    Paleo,
    Keto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Detection certainty in `[0, 1]`.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<IngredientCategory>,
}

/// Per-serving nutrition. Macros in grams, sodium in milligrams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionProfile {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitamins: Option<VitaminNotes>,
}

/// Free-text notes such as "High from carrots".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitaminNotes {
    #[serde(rename = "vitaminA", default, skip_serializing_if = "Option::is_none")]
    pub vitamin_a: Option<String>,
    #[serde(rename = "vitaminC", default, skip_serializing_if = "Option::is_none")]
    pub vitamin_c: Option<String>,
    #[serde(rename = "vitaminD", default, skip_serializing_if = "Option::is_none")]
    pub vitamin_d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calcium: Option<String>,
}

/// The eight major allergens, each flagged explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergenFlags {
    pub dairy: bool,
    pub eggs: bool,
    pub fish: bool,
    pub shellfish: bool,
    pub tree_nuts: bool,
    pub peanuts: bool,
    pub wheat: bool,
    pub soy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AllergenFlags {
    /// Names of the flagged allergens, in declaration order.
    pub fn present(&self) -> Vec<&'static str> {
        [
            (self.dairy, "dairy"),
            (self.eggs, "eggs"),
            (self.fish, "fish"),
            (self.shellfish, "shellfish"),
            (self.tree_nuts, "treeNuts"),
            (self.peanuts, "peanuts"),
            (self.wheat, "wheat"),
            (self.soy, "soy"),
        ]
        .into_iter()
        .filter_map(|(flag, name)| flag.then_some(name))
        .collect()
    }
}

/// Scores are integers in `[1, 10]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRating {
    pub health_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_reason: Option<String>,
    pub kid_friendly: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_labels: Option<Vec<DietaryLabel>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSteps {
    pub difficulty: Difficulty,
    /// Minutes.
    pub prep_time: u32,
    /// Minutes.
    pub cook_time: u32,
    pub servings: u32,
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dietary_labels_are_kebab_case() {
        let json = serde_json::to_string(&vec![DietaryLabel::GlutenFree, DietaryLabel::HighProtein]).unwrap();
        assert_eq!(json, r#"["gluten-free","high-protein"]"#);
    }

    #[test]
    fn allergen_flags_use_camel_case() {
        let flags: AllergenFlags = serde_json::from_str(
            r#"{"dairy":true,"eggs":false,"fish":false,"shellfish":false,
                "treeNuts":true,"peanuts":false,"wheat":false,"soy":false}"#,
        )
        .unwrap();
        assert_eq!(flags.present(), vec!["dairy", "treeNuts"]);
        assert!(flags.details.is_none());
    }

    #[test]
    fn status_only_accepts_success() {
        assert!(serde_json::from_str::<Status>("\"success\"").is_ok());
        assert!(serde_json::from_str::<Status>("\"error\"").is_err());
    }

    #[test]
    fn vitamin_notes_keep_original_keys() {
        let notes = VitaminNotes {
            vitamin_c: Some("High from broccoli".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&notes).unwrap(),
            r#"{"vitaminC":"High from broccoli"}"#
        );
    }
}
