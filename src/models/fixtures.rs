//! Shared test data builders

use chrono::NaiveDate;
use rusqlite::Connection;

use super::*;

pub(crate) fn recipe(conn: &Connection, name: &str, servings: i64) -> i64 {
    let data = RecipeCreate {
        name: name.to_string(),
        instructions: String::new(),
        servings,
        flavor_profile: String::new(),
        meal_types: vec![MealType::Dinner],
        prep_time_minutes: None,
        cook_time_minutes: None,
    };
    Recipe::create(conn, &data).unwrap().id
}

pub(crate) fn line(ingredient: &str, quantity: &str, unit: &str) -> IngredientLine {
    IngredientLine {
        ingredient_id: None,
        ingredient_name: Some(ingredient.to_string()),
        quantity: quantity.to_string(),
        unit: unit.to_string(),
        note: None,
    }
}

pub(crate) fn plan(conn: &Connection, start: NaiveDate, end: NaiveDate) -> i64 {
    let data = MealPlanCreate { name: None, start_date: start, end_date: end };
    MealPlan::create(conn, &data).unwrap().id
}

pub(crate) fn assign(
    conn: &Connection,
    meal_plan_id: i64,
    recipe_id: i64,
    date: NaiveDate,
    meal_type: MealType,
    servings: i64,
) -> i64 {
    let data = MealPlanRecipeCreate { recipe_id, date, meal_type, servings };
    MealPlanRecipe::create(conn, meal_plan_id, &data).unwrap().id
}

/// A shopping list on a fresh, empty one-day plan
pub(crate) fn empty_list(conn: &Connection) -> i64 {
    let day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let meal_plan_id = plan(conn, day, day);
    conn.execute(
        "INSERT INTO shopping_lists (meal_plan_id) VALUES (?1)",
        [meal_plan_id],
    )
    .unwrap();
    conn.last_insert_rowid()
}
