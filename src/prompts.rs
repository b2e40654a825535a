//! Prompts for the vision and structuring stages.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: the vision prompt must ask for exactly the
//!    facts the schema later requires, so the two are edited side by side.
//!
//! 2. **Testability**: unit tests can inspect prompts directly without
//!    spinning up a real model, making prompt regressions easy to catch.
//!
//! The vision model is asked for a thorough free-text description rather
//! than JSON: multimodal models describe well and format poorly. Formatting
//! is left to the structuring model, which sees the schema.

use crate::mode::AnalysisMode;

const DISH_VISION_PROMPT: &str = r#"Analyze this dish image in detail. Describe:

1. IDENTITY
   - Dish name and type of cuisine
   - Course: appetizer, main, dessert, beverage, snack, or side
   - Cooking method and preparation style (grilled, baked, fried, raw...)

2. INGREDIENTS
   - ALL visible ingredients with approximate quantities and units
   - For each, how certain you are that it is really there
   - Food group of each: protein, vegetable, fruit, grain, dairy, fat, seasoning, other

3. NUTRITION (for ONE serving as shown)
   - Estimated calories, protein, carbohydrates and fat in grams
   - Fiber, sugar (grams) and sodium (milligrams) if you can estimate them
   - Notable vitamins and minerals (vitamin A, C, D, iron, calcium) and their sources

4. ALLERGENS
   - Whether it contains dairy, eggs, fish, shellfish, tree nuts, peanuts, wheat, or soy
   - Where each allergen comes from

5. HEALTH
   - How healthy it is on a 1-10 scale, and why
   - How kid-friendly it is on a 1-10 scale, and why
   - Which labels apply: vegetarian, vegan, gluten-free, dairy-free, low-carb, high-protein, paleo, keto

6. HOW TO MAKE IT
   - Difficulty (easy, medium, hard), prep and cook time in minutes, servings
   - Step-by-step preparation
   - A tip to make it healthier or more kid-friendly

Be specific and thorough."#;

const FRIDGE_VISION_PROMPT: &str = r#"Analyze these refrigerator/pantry images. Several photos may show different shelves of the same fridge; treat them as one inventory and do not count an item twice. Describe:

1. INVENTORY
   - ALL visible food items and ingredients, with quantities ("3 eggs", "half full")
   - Where each item is (top shelf, door, crisper drawer...)
   - Food group of each: protein, vegetable, fruit, dairy, grain, condiment, beverage, other
   - How certain you are about each item

2. FRESHNESS
   - Appearance and packaging condition of each item
   - Which items are fresh, still good, should be used soon, or look expired

3. ALLERGENS
   - Whether the contents include dairy, eggs, fish, shellfish, tree nuts, peanuts, wheat, or soy

4. BALANCE
   - Whether proteins, vegetables, fruits and whole grains are present
   - How balanced the fridge is on a 1-10 scale, and what is missing

5. MEAL IDEAS
   - Three kid-friendly meals that can be made mostly from these items
   - For each: ingredients with amounts and whether they are in the fridge, steps,
     prep and cook time, servings, difficulty, kid appeal, and rough nutrition per serving

6. SHOPPING
   - What to buy to make the fridge more balanced

List everything you can see."#;

const RECIPE_VISION_PROMPT: &str = r#"Extract the recipe from this image (cookbook page, recipe card, handwritten note, or screen). Transcribe exactly as shown:

1. The recipe name/title
2. The complete ingredient list, one line per ingredient, with quantities exactly as written
3. The instructions, step by step, in order, exactly as written
4. Any metadata shown: source, author, prep time, cook time, servings, difficulty

Then, separately and clearly marked as your own estimate:
5. Rough nutrition per serving (calories, protein, carbs, fat) if it can be inferred
6. Which of these allergens the ingredients contain: dairy, eggs, fish, shellfish, tree nuts, peanuts, wheat, soy
7. How healthy (1-10) and how kid-friendly (1-10) the recipe is

Do not correct, reorder or summarise the original text."#;

/// Build the prompt sent to the vision model.
pub fn vision_prompt(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::Dish => DISH_VISION_PROMPT,
        AnalysisMode::Fridge => FRIDGE_VISION_PROMPT,
        AnalysisMode::Recipe => RECIPE_VISION_PROMPT,
    }
}

/// The one rule the structuring model most often breaks for each mode.
fn mode_rule(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::Dish => {
            "Nutrition MUST describe ONE serving of the dish as photographed and be \
plausible for that portion; a typical plated main is 300-900 kcal. \
\"ingredients\" and \"recipe.steps\" must not be empty."
        }
        AnalysisMode::Fridge => {
            "\"suggestedRecipes\" MUST contain EXACTLY 3 recipes, no more and no fewer, \
even if the analysis mentions more or fewer ideas. Each recipe must be kid-friendly, \
use mostly ingredients from the fridge, and mark every ingredient's \"available\" flag."
        }
        AnalysisMode::Recipe => {
            "Copy \"ingredients\" and \"instructions\" VERBATIM from the analysis, one array \
element per line or step, in the original order. Do not invent steps. Only fill \
\"nutrition\", \"allergens\" and \"health\" if the analysis supports them; otherwise omit them."
        }
    }
}

/// Reference values that keep estimated magnitudes realistic.
const NUTRITION_ANCHORS: &str = "\
- 100 g grilled chicken breast: 165 kcal, 31 g protein, 0 g carbs, 3.6 g fat
- 1 cup (160 g) cooked white rice: 205 kcal, 4 g protein, 45 g carbs, 0.4 g fat
- 100 g steamed broccoli: 35 kcal, 2.4 g protein, 7 g carbs, 0.4 g fat
- 1 large egg: 72 kcal, 6 g protein, 0.4 g carbs, 5 g fat
- 1 tbsp olive oil: 120 kcal, 0 g protein, 0 g carbs, 14 g fat
- 1 slice whole wheat bread: 80 kcal, 4 g protein, 14 g carbs, 1 g fat";

/// Build the prompt sent to the structuring model.
///
/// The descriptive text is embedded verbatim between triple quotes.
pub fn structuring_prompt(mode: AnalysisMode, description: &str, schema: &str) -> String {
    format!(
        r#"Convert the following analysis into STRICT JSON matching this JSON Schema:

{schema}

Raw analysis:
"""
{description}
"""

CRITICAL RULES:
1. Return ONLY valid JSON: no markdown, no code fences, no explanations, no text before or after
2. "status" MUST be "success"
3. All required fields MUST be present; omit optional fields you cannot fill instead of using null
4. Enum fields MUST use one of the listed values exactly as written
5. Confidence scores are numbers from 0 to 1 reflecting detection certainty
6. Scores (healthScore, kidFriendly, balanceScore) are whole numbers from 1 to 10
7. Times are whole minutes; servings is a whole number of at least 1
8. Use realistic estimates for missing numbers (calories 50-2000 per serving, prep time 5-120 minutes)
9. For {mode} mode: {rule}

Reference values for plausible nutrition:
{anchors}

Return the JSON now:"#,
        schema = schema,
        description = description,
        mode = mode,
        rule = mode_rule(mode),
        anchors = NUTRITION_ANCHORS,
    )
}

/// Build the follow-up prompt used when repair attempts are enabled.
///
/// The original structuring prompt is repeated so the model keeps the schema
/// and the analysis in view, followed by its rejected output and the reason.
pub fn repair_prompt(original_prompt: &str, rejected_output: &str, failure: &str) -> String {
    format!(
        "{original_prompt}\n\n\
Your previous answer was rejected.\n\
Previous answer:\n\"\"\"\n{rejected_output}\n\"\"\"\n\
Reason: {failure}\n\n\
Return the corrected JSON only:"
    )
}
