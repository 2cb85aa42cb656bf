//! Loads everything the aggregator needs for one meal plan

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::DbResult;
use crate::models::{MealPlan, MealPlanRecipe, Recipe, RecipeIngredient};
use super::aggregator::{generate, Assignment, IngredientUsage, LineItem, PlannedRecipe};

/// A meal plan's assignments plus every recipe they reference
#[derive(Debug, Clone, Serialize)]
pub struct PlanSnapshot {
    pub meal_plan_id: i64,
    pub assignments: Vec<Assignment>,
    pub recipes: HashMap<i64, PlannedRecipe>,
}

impl PlanSnapshot {
    /// `None` when the meal plan does not exist
    pub fn load(conn: &Connection, meal_plan_id: i64) -> DbResult<Option<Self>> {
        if MealPlan::get_by_id(conn, meal_plan_id)?.is_none() {
            return Ok(None);
        }

        let assignments: Vec<Assignment> = MealPlanRecipe::list_for_plan(conn, meal_plan_id)?
            .into_iter()
            .map(|a| Assignment {
                recipe_id: a.recipe_id,
                servings: a.servings,
                date: a.date,
                meal_type: a.meal_type,
            })
            .collect();

        let mut recipes = HashMap::new();
        for assignment in &assignments {
            if recipes.contains_key(&assignment.recipe_id) {
                continue;
            }
            let Some(recipe) = Recipe::get_by_id(conn, assignment.recipe_id)? else {
                continue;
            };
            let ingredients = RecipeIngredient::get_details_for_recipe(conn, recipe.id)?
                .into_iter()
                .map(|line| IngredientUsage {
                    ingredient_id: line.ingredient_id,
                    ingredient_name: line.ingredient_name,
                    quantity: Some(line.quantity),
                    unit: Some(line.unit),
                    note: line.note,
                    recipe_section_id: line.recipe_section_id,
                })
                .collect();
            recipes.insert(
                recipe.id,
                PlannedRecipe {
                    id: recipe.id,
                    name: recipe.name,
                    servings: recipe.servings,
                    ingredients,
                },
            );
        }

        tracing::debug!(
            meal_plan_id,
            assignments = assignments.len(),
            recipes = recipes.len(),
            "loaded plan snapshot"
        );

        Ok(Some(Self {
            meal_plan_id,
            assignments,
            recipes,
        }))
    }

    pub fn generate(&self) -> Vec<LineItem> {
        generate(&self.assignments, &self.recipes)
    }
}
