//! Shopping list aggregation
//!
//! Every assignment scales its recipe by `target servings / base servings`;
//! contributions are summed per `(ingredient, unit)`. Units are never
//! converted into each other, so "butter / cup" and "butter / tbsp" stay
//! separate lines.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::MealType;
use crate::quantity::round_quantity;

/// One use of an ingredient in a recipe (flat or inside a section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientUsage {
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub note: Option<String>,
    pub recipe_section_id: Option<i64>,
}

/// A recipe as the aggregator needs it: base servings plus every usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedRecipe {
    pub id: i64,
    pub name: String,
    pub servings: i64,
    pub ingredients: Vec<IngredientUsage>,
}

/// A recipe scheduled into a meal plan slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub recipe_id: i64,
    pub servings: i64,
    pub date: NaiveDate,
    pub meal_type: MealType,
}

/// Generated shopping list line, unique per `(ingredient_id, unit)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub unit: String,
    pub quantity: f64,
    pub sort_order: i64,
    pub is_purchased: bool,
}

/// Recipe lookup used while aggregating
pub trait RecipeBook {
    fn recipe(&self, id: i64) -> Option<&PlannedRecipe>;
}

impl RecipeBook for HashMap<i64, PlannedRecipe> {
    fn recipe(&self, id: i64) -> Option<&PlannedRecipe> {
        self.get(&id)
    }
}

impl RecipeBook for [PlannedRecipe] {
    fn recipe(&self, id: i64) -> Option<&PlannedRecipe> {
        self.iter().find(|r| r.id == id)
    }
}

impl RecipeBook for Vec<PlannedRecipe> {
    fn recipe(&self, id: i64) -> Option<&PlannedRecipe> {
        self.as_slice().recipe(id)
    }
}

struct Accumulator {
    ingredient_id: i64,
    ingredient_name: String,
    unit: String,
    quantity: f64,
}

/// Build shopping list lines for a set of assignments.
///
/// Assignments whose recipe is missing or has fewer than one base serving
/// are skipped, as are usages without a quantity or unit. Lines come back
/// sorted by ingredient name (byte order, ties in first-seen order) with
/// 1-based `sort_order` and quantities rounded to two decimals.
pub fn generate<B>(assignments: &[Assignment], recipes: &B) -> Vec<LineItem>
where
    B: RecipeBook + ?Sized,
{
    let mut index: HashMap<(i64, String), usize> = HashMap::new();
    let mut entries: Vec<Accumulator> = Vec::new();

    for assignment in assignments {
        let recipe = match recipes.recipe(assignment.recipe_id) {
            Some(recipe) if recipe.servings >= 1 => recipe,
            Some(recipe) => {
                tracing::debug!(
                    recipe_id = recipe.id,
                    servings = recipe.servings,
                    "skipping recipe without a usable serving count"
                );
                continue;
            }
            None => {
                tracing::debug!(recipe_id = assignment.recipe_id, "skipping missing recipe");
                continue;
            }
        };

        let scale = assignment.servings as f64 / recipe.servings as f64;

        for usage in &recipe.ingredients {
            let (Some(quantity), Some(unit)) = (usage.quantity, usage.unit.as_ref()) else {
                continue;
            };

            let key = (usage.ingredient_id, unit.clone());
            let slot = *index.entry(key).or_insert_with(|| {
                entries.push(Accumulator {
                    ingredient_id: usage.ingredient_id,
                    ingredient_name: usage.ingredient_name.clone(),
                    unit: unit.clone(),
                    quantity: 0.0,
                });
                entries.len() - 1
            });

            entries[slot].quantity += quantity * scale;
        }
    }

    // Stable sort keeps first-seen order for equal names
    entries.sort_by(|a, b| a.ingredient_name.cmp(&b.ingredient_name));

    let items: Vec<LineItem> = entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| LineItem {
            ingredient_id: entry.ingredient_id,
            ingredient_name: entry.ingredient_name,
            unit: entry.unit,
            quantity: round_quantity(entry.quantity),
            sort_order: position as i64 + 1,
            is_purchased: false,
        })
        .collect();

    tracing::debug!(
        assignments = assignments.len(),
        items = items.len(),
        "aggregated shopping list"
    );

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(id: i64, name: &str, quantity: f64, unit: &str) -> IngredientUsage {
        IngredientUsage {
            ingredient_id: id,
            ingredient_name: name.to_string(),
            quantity: Some(quantity),
            unit: Some(unit.to_string()),
            note: None,
            recipe_section_id: None,
        }
    }

    fn recipe(id: i64, servings: i64, ingredients: Vec<IngredientUsage>) -> PlannedRecipe {
        PlannedRecipe {
            id,
            name: format!("Recipe {id}"),
            servings,
            ingredients,
        }
    }

    fn assign(recipe_id: i64, servings: i64) -> Assignment {
        Assignment {
            recipe_id,
            servings,
            date: NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            meal_type: MealType::Dinner,
        }
    }

    fn book(recipes: Vec<PlannedRecipe>) -> HashMap<i64, PlannedRecipe> {
        recipes.into_iter().map(|r| (r.id, r)).collect()
    }

    fn find<'a>(items: &'a [LineItem], name: &str, unit: &str) -> &'a LineItem {
        items
            .iter()
            .find(|i| i.ingredient_name == name && i.unit == unit)
            .unwrap()
    }

    const FLOUR: i64 = 1;
    const BUTTER: i64 = 2;
    const GARLIC: i64 = 3;

    #[test]
    fn scales_and_sums_across_recipes() {
        let recipes = book(vec![
            recipe(1, 2, vec![usage(FLOUR, "flour", 0.5, "cup"), usage(BUTTER, "butter", 0.25, "cup")]),
            recipe(2, 4, vec![usage(FLOUR, "flour", 0.75, "cup"), usage(BUTTER, "butter", 1.0 / 3.0, "cup")]),
        ]);

        let items = generate(&[assign(1, 4), assign(2, 2)], &recipes);

        assert_eq!(items.len(), 2);
        assert_eq!(find(&items, "flour", "cup").quantity, 1.38);
        assert_eq!(find(&items, "butter", "cup").quantity, 0.67);
    }

    #[test]
    fn same_ingredient_same_unit_collapses_to_one_line() {
        let recipes = book(vec![
            recipe(1, 2, vec![usage(GARLIC, "garlic", 3.0, "cloves")]),
            recipe(2, 2, vec![usage(GARLIC, "garlic", 8.0, "cloves")]),
            recipe(3, 1, vec![usage(GARLIC, "garlic", 2.0, "cloves")]),
        ]);

        let items = generate(&[assign(1, 2), assign(2, 1), assign(3, 2)], &recipes);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 11.0);
        assert_eq!(items[0].sort_order, 1);
    }

    #[test]
    fn different_units_stay_separate() {
        let recipes = book(vec![
            recipe(1, 1, vec![usage(BUTTER, "butter", 1.0, "cup")]),
            recipe(2, 1, vec![usage(BUTTER, "butter", 2.0, "tbsp")]),
        ]);

        let items = generate(&[assign(1, 1), assign(2, 1)], &recipes);

        assert_eq!(items.len(), 2);
        assert_eq!(find(&items, "butter", "cup").quantity, 1.0);
        assert_eq!(find(&items, "butter", "tbsp").quantity, 2.0);
    }

    #[test]
    fn decimal_ties_round_half_up() {
        let recipes = book(vec![recipe(1, 1, vec![usage(GARLIC, "garlic powder", 1.015, "tsp")])]);
        let items = generate(&[assign(1, 1)], &recipes);
        assert_eq!(items[0].quantity, 1.02);
    }

    #[test]
    fn empty_plan_yields_empty_list() {
        let recipes: HashMap<i64, PlannedRecipe> = HashMap::new();
        assert!(generate(&[], &recipes).is_empty());
    }

    #[test]
    fn zero_serving_and_missing_recipes_are_skipped() {
        let recipes = book(vec![
            recipe(1, 0, vec![usage(FLOUR, "flour", 1.0, "cup")]),
            recipe(2, -3, vec![usage(FLOUR, "flour", 1.0, "cup")]),
            recipe(3, 1, vec![usage(BUTTER, "butter", 1.0, "tbsp")]),
        ]);

        let items = generate(&[assign(1, 4), assign(2, 4), assign(99, 4), assign(3, 1)], &recipes);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].ingredient_name, "butter");
    }

    #[test]
    fn usages_without_quantity_or_unit_are_skipped() {
        let mut no_unit = usage(FLOUR, "flour", 1.0, "cup");
        no_unit.unit = None;
        let mut no_quantity = usage(BUTTER, "butter", 1.0, "cup");
        no_quantity.quantity = None;

        let recipes = book(vec![
            recipe(1, 1, vec![no_unit, no_quantity, usage(GARLIC, "garlic", 2.0, "cloves")]),
            recipe(2, 1, vec![]),
        ]);

        let items = generate(&[assign(2, 1), assign(1, 1)], &recipes);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].ingredient_name, "garlic");
    }

    #[test]
    fn sections_do_not_affect_aggregation() {
        let mut crust = usage(BUTTER, "butter", 0.5, "cup");
        crust.recipe_section_id = Some(10);
        let mut filling = usage(BUTTER, "butter", 0.25, "cup");
        filling.recipe_section_id = Some(11);

        let recipes = book(vec![recipe(1, 1, vec![crust, filling])]);
        let items = generate(&[assign(1, 2)], &recipes);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 1.5);
    }

    #[test]
    fn orders_by_name_and_numbers_positions() {
        let recipes = book(vec![recipe(
            1,
            1,
            vec![
                usage(5, "onion", 1.0, "each"),
                usage(6, "Zucchini", 1.0, "each"),
                usage(7, "apple", 1.0, "each"),
                usage(8, "apple", 1.0, "lb"),
            ],
        )]);

        let items = generate(&[assign(1, 1)], &recipes);
        let names: Vec<(&str, &str, i64)> = items
            .iter()
            .map(|i| (i.ingredient_name.as_str(), i.unit.as_str(), i.sort_order))
            .collect();

        // Byte order puts uppercase first; equal names keep first-seen order
        assert_eq!(
            names,
            vec![("Zucchini", "each", 1), ("apple", "each", 2), ("apple", "lb", 3), ("onion", "each", 4)]
        );
        assert!(items.iter().all(|i| !i.is_purchased));
    }

    #[test]
    fn generation_is_idempotent() {
        let recipes = vec![
            recipe(1, 3, vec![usage(FLOUR, "flour", 2.0, "cup"), usage(GARLIC, "garlic", 1.0, "cloves")]),
            recipe(2, 2, vec![usage(FLOUR, "flour", 0.1, "cup")]),
        ];
        let assignments = [assign(1, 5), assign(2, 3), assign(1, 1)];

        assert_eq!(generate(&assignments, &recipes), generate(&assignments, &recipes));
    }

    #[test]
    fn repeated_assignments_accumulate() {
        let recipes = vec![recipe(1, 4, vec![usage(FLOUR, "flour", 1.0, "cup")])];
        let items = generate(&[assign(1, 2), assign(1, 2)], recipes.as_slice());
        assert_eq!(items[0].quantity, 1.0);
    }
}
