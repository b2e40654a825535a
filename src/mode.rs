//! Analysis modes.
//!
//! The mode is resolved once at request entry and then selects everything
//! mode-specific downstream: the vision prompt, the structuring rule, the
//! schema, the typed record, and how many images reach the vision model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the photo(s) show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// A single plated dish.
    Dish,
    /// The inside of a fridge or pantry, possibly across several photos.
    Fridge,
    /// A printed, handwritten or on-screen recipe.
    Recipe,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 3] = [AnalysisMode::Dish, AnalysisMode::Fridge, AnalysisMode::Recipe];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Dish => "dish",
            AnalysisMode::Fridge => "fridge",
            AnalysisMode::Recipe => "recipe",
        }
    }

    /// Whether every supplied image is sent to the vision model.
    ///
    /// Fridge shelves rarely fit one frame; every other mode describes one
    /// subject and only the first image is used.
    pub fn accepts_multiple_images(&self) -> bool {
        matches!(self, AnalysisMode::Fridge)
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of `dish`, `fridge`, `recipe`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid mode '{0}'. Must be one of: dish, fridge, recipe")]
pub struct UnknownMode(pub String);

impl FromStr for AnalysisMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dish" => Ok(AnalysisMode::Dish),
            "fridge" => Ok(AnalysisMode::Fridge),
            "recipe" => Ok(AnalysisMode::Recipe),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}
