//! Mode schemas: one machine-readable JSON Schema per [`AnalysisMode`].
//!
//! Each schema serves twice. Pretty-printed, it is embedded in the
//! structuring prompt so the model sees the exact target shape. Interpreted
//! by [`check`], it is the gate every structuring output must pass before it
//! becomes a typed record.

pub mod check;
mod definitions;

pub use check::Violation;

use crate::mode::AnalysisMode;
use once_cell::sync::Lazy;
use serde_json::Value;

static DISH: Lazy<Value> = Lazy::new(definitions::dish);
static FRIDGE: Lazy<Value> = Lazy::new(definitions::fridge);
static RECIPE: Lazy<Value> = Lazy::new(definitions::recipe);

/// The schema document for `mode`.
pub fn schema_for(mode: AnalysisMode) -> &'static Value {
    match mode {
        AnalysisMode::Dish => &DISH,
        AnalysisMode::Fridge => &FRIDGE,
        AnalysisMode::Recipe => &RECIPE,
    }
}

/// Pretty-printed schema, as embedded in the structuring prompt.
pub fn schema_description(mode: AnalysisMode) -> String {
    // Serialising a `Value` cannot fail.
    serde_json::to_string_pretty(schema_for(mode)).unwrap_or_default()
}
