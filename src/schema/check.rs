//! A small JSON Schema interpreter.
//!
//! Supports exactly the keywords used in [`super::definitions`]: `type`,
//! `properties`, `required`, `items`, `enum`, `const`, `minimum`, `maximum`,
//! `minItems`, `maxItems`. Unknown keywords (`description`) are ignored and
//! properties not listed in `properties` are allowed; the typed record drops
//! them.
//!
//! Violations are collected in document order rather than stopping at the
//! first, so logs show the full picture while callers report the first.

use serde_json::{Number, Value};
use std::fmt;

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSONPath-style location, e.g. `$.data.suggestedRecipes[1].healthScore`.
    pub path: String,
    pub constraint: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.constraint)
    }
}

/// Check `value` against `schema`, returning every violation.
///
/// Whole-valued floats at `integer` positions (`7.0`) are rewritten to
/// integers in place so the typed record can deserialise them.
pub fn check(schema: &Value, value: &mut Value) -> Vec<Violation> {
    let mut out = Vec::new();
    check_node(schema, value, "$", &mut out);
    out
}

fn check_node(schema: &Value, value: &mut Value, path: &str, out: &mut Vec<Violation>) {
    let mut fail = |constraint: String| {
        out.push(Violation {
            path: path.to_string(),
            constraint,
        })
    };

    if let Some(expected) = schema.get("const") {
        if *value != *expected {
            fail(format!("must equal {expected}, found {}", describe(value)));
            return;
        }
    }

    if let Some(ty) = schema.get("type").and_then(Value::as_str) {
        if !matches_type(ty, value) {
            fail(format!("expected {ty}, found {}", describe(value)));
            return;
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            let list: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
            fail(format!(
                "{} is not one of [{}]",
                describe(value),
                list.join(", ")
            ));
            return;
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
            if n < min {
                fail(format!("{n} is below the minimum of {min}"));
            }
        }
        if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
            if n > max {
                fail(format!("{n} is above the maximum of {max}"));
            }
        }
    }

    match value {
        Value::Object(map) => {
            if let Some(required) = schema.get("required").and_then(Value::as_array) {
                for key in required.iter().filter_map(Value::as_str) {
                    if map.get(key).map_or(true, Value::is_null) {
                        out.push(Violation {
                            path: format!("{path}.{key}"),
                            constraint: "missing required field".to_string(),
                        });
                    }
                }
            }
            if let Some(props) = schema.get("properties").and_then(Value::as_object) {
                for (key, sub_schema) in props {
                    match map.get_mut(key) {
                        // Absent optional fields (null included) are fine;
                        // required ones were reported above.
                        None | Some(Value::Null) => {}
                        Some(child) => check_node(sub_schema, child, &format!("{path}.{key}"), out),
                    }
                }
            }
        }
        Value::Array(items) => {
            let len = items.len();
            let min = schema.get("minItems").and_then(Value::as_u64);
            let max = schema.get("maxItems").and_then(Value::as_u64);
            match (min, max) {
                (Some(lo), Some(hi)) if lo == hi && len as u64 != lo => out.push(Violation {
                    path: path.to_string(),
                    constraint: format!("expected exactly {lo} items, found {len}"),
                }),
                _ => {
                    if let Some(lo) = min.filter(|lo| (len as u64) < *lo) {
                        out.push(Violation {
                            path: path.to_string(),
                            constraint: format!("expected at least {lo} items, found {len}"),
                        });
                    }
                    if let Some(hi) = max.filter(|hi| (len as u64) > *hi) {
                        out.push(Violation {
                            path: path.to_string(),
                            constraint: format!("expected at most {hi} items, found {len}"),
                        });
                    }
                }
            }
            if let Some(item_schema) = schema.get("items") {
                for (i, item) in items.iter_mut().enumerate() {
                    check_node(item_schema, item, &format!("{path}[{i}]"), out);
                }
            }
        }
        _ => {}
    }

    if schema.get("type").and_then(Value::as_str) == Some("integer") {
        // matches_type already guaranteed a zero fraction.
        let whole = match value {
            Value::Number(n) if !n.is_i64() && !n.is_u64() => n
                .as_f64()
                .filter(|f| (i64::MIN as f64..i64::MAX as f64).contains(f))
                .map(|f| f as i64),
            _ => None,
        };
        if let Some(i) = whole {
            *value = Value::Number(Number::from(i));
        }
    }
}

fn matches_type(ty: &str, value: &Value) -> bool {
    match ty {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "number" => value.is_number(),
        "integer" => match value {
            Value::Number(n) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            _ => false,
        },
        "null" => value.is_null(),
        _ => true,
    }
}

/// Short rendering of a value for violation messages.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => {
            if s.chars().count() > 40 {
                let head: String = s.chars().take(40).collect();
                format!("string \"{head}…\"")
            } else {
                format!("string \"{s}\"")
            }
        }
        Value::Array(a) => format!("array of {} items", a.len()),
        Value::Object(_) => "object".to_string(),
    }
}
