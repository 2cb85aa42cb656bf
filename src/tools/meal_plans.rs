//! Meal plan tools

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    MealPlan, MealPlanCreate, MealPlanRecipe, MealPlanRecipeCreate, MealPlanRecipeDetail,
    MealPlanRecipeUpdate, MealPlanUpdate, ShoppingList,
};
use super::{page, DeleteResponse};

/// Meal plan with its assignments in calendar order
#[derive(Debug, Serialize)]
pub struct MealPlanDetail {
    #[serde(flatten)]
    pub meal_plan: MealPlan,
    pub recipes: Vec<MealPlanRecipeDetail>,
    pub shopping_list_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListMealPlansResponse {
    pub meal_plans: Vec<MealPlan>,
    pub count: usize,
    pub limit: i64,
    pub offset: i64,
}

pub fn create_meal_plan(db: &Database, data: MealPlanCreate) -> Result<MealPlan, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    MealPlan::create(&conn, &data).map_err(|e| format!("Failed to create meal plan: {}", e))
}

pub fn get_meal_plan(db: &Database, id: i64) -> Result<Option<MealPlanDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(meal_plan) = MealPlan::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get meal plan: {}", e))?
    else {
        return Ok(None);
    };
    let recipes = MealPlanRecipe::details_for_plan(&conn, id)
        .map_err(|e| format!("Failed to get assigned recipes: {}", e))?;
    let shopping_list_id = ShoppingList::get_for_plan(&conn, id)
        .map_err(|e| format!("Failed to get shopping list: {}", e))?
        .map(|list| list.id);

    Ok(Some(MealPlanDetail {
        meal_plan,
        recipes,
        shopping_list_id,
    }))
}

pub fn list_meal_plans(db: &Database, limit: i64, offset: i64) -> Result<ListMealPlansResponse, String> {
    let (limit, offset) = page(limit, offset);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let meal_plans = MealPlan::list(&conn, limit, offset)
        .map_err(|e| format!("Failed to list meal plans: {}", e))?;
    let count = meal_plans.len();
    Ok(ListMealPlansResponse {
        meal_plans,
        count,
        limit,
        offset,
    })
}

pub fn update_meal_plan(db: &Database, id: i64, data: MealPlanUpdate) -> Result<Option<MealPlan>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    MealPlan::update(&conn, id, &data).map_err(|e| format!("Failed to update meal plan: {}", e))
}

/// Assignments and the shopping list go with the plan
pub fn delete_meal_plan(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = MealPlan::delete(&conn, id).map_err(|e| format!("Failed to delete meal plan: {}", e))?;
    Ok(deleted.then(|| DeleteResponse::new(id)))
}

/// Put a recipe on a (date, meal type) slot of the plan
pub fn add_meal_plan_recipe(
    db: &Database,
    meal_plan_id: i64,
    data: MealPlanRecipeCreate,
) -> Result<MealPlanRecipe, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    MealPlanRecipe::create(&conn, meal_plan_id, &data).map_err(|e| format!("Failed to add recipe to meal plan: {}", e))
}

pub fn update_meal_plan_recipe(
    db: &Database,
    id: i64,
    data: MealPlanRecipeUpdate,
) -> Result<Option<MealPlanRecipe>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    MealPlanRecipe::update(&conn, id, &data).map_err(|e| format!("Failed to update meal plan recipe: {}", e))
}

pub fn remove_meal_plan_recipe(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = MealPlanRecipe::delete(&conn, id)
        .map_err(|e| format!("Failed to remove meal plan recipe: {}", e))?;
    Ok(deleted.then(|| DeleteResponse::new(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::models::MealType;
    use crate::tools::test_database;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn detail_lists_assignments_with_recipe_names() {
        let (_dir, db) = test_database();
        let plan = create_meal_plan(&db, MealPlanCreate { name: None, start_date: date(28), end_date: date(31) }).unwrap();
        assert_eq!(plan.name, "January 28 - 31, 2026");

        let recipe_id = db
            .with_conn(|conn| {
                conn.execute("INSERT INTO recipes (name, servings, meal_types) VALUES ('Chili', 6, '[\"Dinner\"]')", [])?;
                Ok(conn.last_insert_rowid())
            })
            .unwrap();
        let data = MealPlanRecipeCreate { recipe_id, date: date(29), meal_type: MealType::Dinner, servings: 3 };
        add_meal_plan_recipe(&db, plan.id, data).unwrap();

        let detail = get_meal_plan(&db, plan.id).unwrap().unwrap();
        assert_eq!(detail.recipes.len(), 1);
        assert_eq!(detail.recipes[0].recipe_name, "Chili");
        assert_eq!(detail.shopping_list_id, None);

        let outside = MealPlanRecipeCreate { recipe_id, date: date(27), meal_type: MealType::Lunch, servings: 3 };
        assert!(add_meal_plan_recipe(&db, plan.id, outside).is_err());

        assert!(delete_meal_plan(&db, plan.id).unwrap().is_some());
        assert!(get_meal_plan(&db, plan.id).unwrap().is_none());
    }
}
