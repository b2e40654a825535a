//! Validation: sanitised text → typed [`StructuredAnalysis`].
//!
//! Two distinct failure points, checked in order:
//!
//! 1. **Parse**: the text is not JSON → `MalformedOutput`, carrying a
//!    truncated excerpt of what the model produced.
//! 2. **Schema**: the JSON breaks the mode's schema → `SchemaViolation`,
//!    carrying the first failing path and constraint.
//!
//! Nothing is repaired here. A plausible-looking guess in a nutrition or
//! allergen field is worse than an error.

use crate::analysis::StructuredAnalysis;
use crate::error::AnalysisError;
use crate::mode::AnalysisMode;
use crate::schema;
use serde_json::Value;
use serde_path_to_error::Segment;
use tracing::debug;

/// Longest excerpt of rejected output kept in a `MalformedOutput` error.
pub const EXCERPT_CHARS: usize = 200;

/// Parse and check `candidate` against the schema for `mode`.
pub fn validate(candidate: &str, mode: AnalysisMode) -> Result<StructuredAnalysis, AnalysisError> {
    let mut value: Value =
        serde_json::from_str(candidate).map_err(|e| AnalysisError::MalformedOutput {
            detail: e.to_string(),
            excerpt: excerpt(candidate),
        })?;

    let violations = schema::check::check(schema::schema_for(mode), &mut value);
    if let Some(first) = violations.first() {
        for v in &violations {
            debug!("{} schema violation: {}", mode, v);
        }
        return Err(AnalysisError::SchemaViolation {
            path: first.path.clone(),
            constraint: first.constraint.clone(),
            total: violations.len(),
        });
    }

    // The schema and the typed records agree, so this only fails if they drift.
    StructuredAnalysis::from_value(mode, value).map_err(|e| AnalysisError::SchemaViolation {
        path: json_path(e.path()),
        constraint: e.inner().to_string(),
        total: 1,
    })
}

/// Render a serde path in the `$.a.b[0]` form the schema checker uses.
fn json_path(path: &serde_path_to_error::Path) -> String {
    let mut out = String::from("$");
    for segment in path.iter() {
        match segment {
            Segment::Seq { index } => out.push_str(&format!("[{index}]")),
            Segment::Map { key } => {
                out.push('.');
                out.push_str(key);
            }
            Segment::Enum { variant } => {
                out.push('.');
                out.push_str(variant);
            }
            Segment::Unknown => out.push_str(".?"),
        }
    }
    out
}

fn excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_CHARS {
        let head: String = text.chars().take(EXCERPT_CHARS).collect();
        format!("{head}…")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISH: &str = include_str!("../../tests/fixtures/dish.json");

    #[test]
    fn accepts_fixture() {
        let record = validate(DISH, AnalysisMode::Dish).unwrap();
        assert_eq!(record.mode(), AnalysisMode::Dish);
    }

    #[test]
    fn prose_is_malformed() {
        let err = validate("here is your json: {\"status\":\"success\"}", AnalysisMode::Dish)
            .unwrap_err();
        match err {
            AnalysisError::MalformedOutput { excerpt, .. } => {
                assert!(excerpt.starts_with("here is your json"))
            }
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }

    #[test]
    fn excerpt_is_truncated() {
        let long = "x".repeat(1000);
        match validate(&long, AnalysisMode::Recipe).unwrap_err() {
            AnalysisError::MalformedOutput { excerpt, .. } => {
                assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 1)
            }
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }

    #[test]
    fn schema_failure_reports_first_path_and_total() {
        let mut value: Value = serde_json::from_str(DISH).unwrap();
        value["data"]["dish"]["category"] = "midnight-snack".into();
        value["data"]["health"]["healthScore"] = 0.into();
        let err = validate(&value.to_string(), AnalysisMode::Dish).unwrap_err();
        match err {
            AnalysisError::SchemaViolation { path, constraint, total } => {
                assert_eq!(path, "$.data.dish.category");
                assert!(constraint.contains("midnight-snack"));
                assert_eq!(total, 2);
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_integer_reports_its_path() {
        let mut value: Value = serde_json::from_str(DISH).unwrap();
        value["data"]["recipe"]["prepTime"] = 5_000_000_000u64.into();
        match validate(&value.to_string(), AnalysisMode::Dish).unwrap_err() {
            AnalysisError::SchemaViolation { path, total, .. } => {
                assert_eq!(path, "$.data.recipe.prepTime");
                assert_eq!(total, 1);
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[test]
    fn typed_record_errors_carry_the_field_path() {
        // Bypasses the schema check to exercise the typed conversion alone.
        let mut value: Value = serde_json::from_str(DISH).unwrap();
        value["data"]["ingredients"][1]["confidence"] = "high".into();
        let err = StructuredAnalysis::from_value(AnalysisMode::Dish, value).unwrap_err();
        assert_eq!(json_path(err.path()), "$.data.ingredients[1].confidence");
    }

    #[test]
    fn json_array_is_a_schema_violation() {
        let err = validate("[1, 2, 3]", AnalysisMode::Fridge).unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaViolation { ref path, .. } if path == "$"));
    }
}
