//! JSON Schema documents, one per mode.
//!
//! Field names, enums and bounds here must agree with the typed records in
//! [`crate::analysis`]; `tests::fixtures_deserialise` in the parent module
//! guards that.

use serde_json::{json, Value};

const DIFFICULTY: [&str; 3] = ["easy", "medium", "hard"];

const DIETARY_LABELS: [&str; 8] = [
    "vegetarian",
    "vegan",
    "gluten-free",
    "dairy-free",
    "low-carb",
    "high-protein",
    "paleo",
    "keto",
];

fn score(description: &str) -> Value {
    json!({ "type": "integer", "minimum": 1, "maximum": 10, "description": description })
}

fn confidence() -> Value {
    json!({
        "type": "number", "minimum": 0, "maximum": 1,
        "description": "detection certainty, 0 = guess, 1 = certain"
    })
}

fn minutes() -> Value {
    json!({ "type": "integer", "minimum": 0, "maximum": u32::MAX, "description": "minutes" })
}

fn servings() -> Value {
    json!({ "type": "integer", "minimum": 1, "maximum": u32::MAX })
}

fn grams(description: &str) -> Value {
    json!({ "type": "number", "minimum": 0, "description": description })
}

fn non_empty_strings(description: &str) -> Value {
    json!({
        "type": "array", "minItems": 1,
        "items": { "type": "string" },
        "description": description
    })
}

fn nutrition() -> Value {
    json!({
        "type": "object",
        "description": "nutrition for ONE serving",
        "properties": {
            "calories": grams("kcal"),
            "protein": grams("grams"),
            "carbs": grams("grams"),
            "fat": grams("grams"),
            "fiber": grams("grams"),
            "sugar": grams("grams"),
            "sodium": grams("milligrams"),
            "vitamins": {
                "type": "object",
                "description": "short notes, e.g. \"High from carrots\"",
                "properties": {
                    "vitaminA": { "type": "string" },
                    "vitaminC": { "type": "string" },
                    "vitaminD": { "type": "string" },
                    "iron": { "type": "string" },
                    "calcium": { "type": "string" }
                }
            }
        },
        "required": ["calories", "protein", "carbs", "fat"]
    })
}

fn allergens() -> Value {
    json!({
        "type": "object",
        "properties": {
            "dairy": { "type": "boolean" },
            "eggs": { "type": "boolean" },
            "fish": { "type": "boolean" },
            "shellfish": { "type": "boolean" },
            "treeNuts": { "type": "boolean" },
            "peanuts": { "type": "boolean" },
            "wheat": { "type": "boolean" },
            "soy": { "type": "boolean" },
            "details": { "type": "string" }
        },
        "required": ["dairy", "eggs", "fish", "shellfish", "treeNuts", "peanuts", "wheat", "soy"]
    })
}

fn health() -> Value {
    json!({
        "type": "object",
        "properties": {
            "healthScore": score("1 = very unhealthy, 10 = very healthy"),
            "healthReason": { "type": "string" },
            "kidFriendly": score("1 = not kid-friendly, 10 = very kid-friendly"),
            "kidReason": { "type": "string" },
            "dietaryLabels": {
                "type": "array",
                "items": { "type": "string", "enum": DIETARY_LABELS }
            }
        },
        "required": ["healthScore", "kidFriendly"]
    })
}

fn success() -> Value {
    json!({ "const": "success" })
}

pub(super) fn dish() -> Value {
    json!({
        "type": "object",
        "properties": {
            "status": success(),
            "data": {
                "type": "object",
                "properties": {
                    "dish": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "cuisine": { "type": "string" },
                            "category": {
                                "type": "string",
                                "enum": ["appetizer", "main", "dessert", "beverage", "snack", "side"]
                            },
                            "cookingMethod": { "type": "string", "description": "e.g. grilled, baked" }
                        },
                        "required": ["name", "cuisine", "category"]
                    },
                    "ingredients": {
                        "type": "array",
                        "minItems": 1,
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string" },
                                "amount": { "type": "string" },
                                "unit": { "type": "string" },
                                "confidence": confidence(),
                                "category": {
                                    "type": "string",
                                    "enum": ["protein", "vegetable", "fruit", "grain", "dairy", "fat", "seasoning", "other"]
                                }
                            },
                            "required": ["name", "confidence"]
                        }
                    },
                    "nutrition": nutrition(),
                    "allergens": allergens(),
                    "health": health(),
                    "recipe": {
                        "type": "object",
                        "properties": {
                            "difficulty": { "type": "string", "enum": DIFFICULTY },
                            "prepTime": minutes(),
                            "cookTime": minutes(),
                            "servings": servings(),
                            "steps": non_empty_strings("ordered preparation steps"),
                            "tips": { "type": "string" }
                        },
                        "required": ["difficulty", "prepTime", "cookTime", "servings", "steps"]
                    }
                },
                "required": ["dish", "ingredients", "nutrition", "allergens", "health", "recipe"]
            }
        },
        "required": ["status", "data"]
    })
}

pub(super) fn fridge() -> Value {
    json!({
        "type": "object",
        "properties": {
            "status": success(),
            "data": {
                "type": "object",
                "properties": {
                    "ingredients": {
                        "type": "array",
                        "minItems": 1,
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string" },
                                "category": {
                                    "type": "string",
                                    "enum": ["protein", "vegetable", "fruit", "dairy", "grain", "condiment", "beverage", "other"]
                                },
                                "freshness": {
                                    "type": "string",
                                    "enum": ["fresh", "good", "use-soon", "expired"]
                                },
                                "confidence": confidence(),
                                "quantity": { "type": "string", "description": "e.g. half full, 3 eggs" },
                                "location": { "type": "string", "description": "e.g. top shelf, door" }
                            },
                            "required": ["name", "category", "freshness", "confidence"]
                        }
                    },
                    "allergens": allergens(),
                    "nutritionAssessment": {
                        "type": "object",
                        "properties": {
                            "hasProteins": { "type": "boolean" },
                            "hasVegetables": { "type": "boolean" },
                            "hasFruits": { "type": "boolean" },
                            "hasWholeGrains": { "type": "boolean" },
                            "balanceScore": score("how balanced the fridge is"),
                            "notes": { "type": "string" }
                        },
                        "required": ["hasProteins", "hasVegetables", "hasFruits", "hasWholeGrains", "balanceScore", "notes"]
                    },
                    "suggestedRecipes": {
                        "type": "array",
                        "minItems": 3,
                        "maxItems": 3,
                        "description": "exactly 3 kid-friendly meals",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string" },
                                "description": { "type": "string" },
                                "ingredients": {
                                    "type": "array",
                                    "minItems": 1,
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "name": { "type": "string" },
                                            "amount": { "type": "string" },
                                            "available": { "type": "boolean", "description": "is it in the fridge?" }
                                        },
                                        "required": ["name", "amount", "available"]
                                    }
                                },
                                "instructions": non_empty_strings("step-by-step cooking instructions"),
                                "prepTime": minutes(),
                                "cookTime": minutes(),
                                "servings": servings(),
                                "difficulty": { "type": "string", "enum": DIFFICULTY },
                                "kidFriendly": score("1 = not kid-friendly, 10 = very kid-friendly"),
                                "kidAppeal": { "type": "string", "description": "why kids will love this" },
                                "healthScore": score("1 = very unhealthy, 10 = very healthy"),
                                "nutrition": nutrition()
                            },
                            "required": [
                                "name", "description", "ingredients", "instructions", "prepTime", "cookTime",
                                "servings", "difficulty", "kidFriendly", "kidAppeal", "healthScore", "nutrition"
                            ]
                        }
                    },
                    "shoppingList": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "what to buy to improve nutrition"
                    }
                },
                "required": ["ingredients", "allergens", "nutritionAssessment", "suggestedRecipes"]
            }
        },
        "required": ["status", "data"]
    })
}

pub(super) fn recipe() -> Value {
    json!({
        "type": "object",
        "properties": {
            "status": success(),
            "data": {
                "type": "object",
                "properties": {
                    "recipeName": { "type": "string" },
                    "ingredients": non_empty_strings("ingredient lines exactly as written"),
                    "instructions": non_empty_strings("steps exactly as written, in order"),
                    "metadata": {
                        "type": "object",
                        "properties": {
                            "source": { "type": "string" },
                            "author": { "type": "string" },
                            "prepTime": minutes(),
                            "cookTime": minutes(),
                            "servings": servings(),
                            "difficulty": { "type": "string", "enum": DIFFICULTY }
                        }
                    },
                    "nutrition": nutrition(),
                    "allergens": allergens(),
                    "health": health()
                },
                "required": ["recipeName", "ingredients", "instructions", "metadata"]
            }
        },
        "required": ["status", "data"]
    })
}
