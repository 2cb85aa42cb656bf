//! Recipe MCP Tools
//!
//! Recipes with their ingredient lines, either as one flat list or grouped
//! into named sections.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{Database, DbResult};
use crate::models::{
    replace_recipe_ingredients, IngredientLine, MealType, Recipe, RecipeCreate, RecipeIngredient,
    RecipeIngredientDetail, RecipeSection, RecipeUpdate, SectionInput,
};
use super::{page, DeleteResponse};

/// Section with its own ingredient lines
#[derive(Debug, Serialize)]
pub struct RecipeSectionDetail {
    pub id: i64,
    pub name: String,
    pub sort_order: i64,
    pub instructions: Option<String>,
    pub ingredients: Vec<RecipeIngredientDetail>,
}

/// Full recipe detail; `ingredients` holds lines outside any section
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredientDetail>,
    pub sections: Vec<RecipeSectionDetail>,
    pub times_planned: i64,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub servings: i64,
    pub meal_types: Vec<MealType>,
    pub flavor_profile: String,
    pub ingredient_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for delete blocked
#[derive(Debug, Serialize)]
pub struct RecipeDeleteBlockedResponse {
    pub error: String,
    pub times_planned: i64,
}

fn load_detail(conn: &Connection, recipe: Recipe) -> DbResult<RecipeDetail> {
    let lines = RecipeIngredient::get_details_for_recipe(conn, recipe.id)?;
    let (ingredients, sectioned): (Vec<_>, Vec<_>) =
        lines.into_iter().partition(|l| l.recipe_section_id.is_none());

    let sections = RecipeSection::list_for_recipe(conn, recipe.id)?
        .into_iter()
        .map(|section| RecipeSectionDetail {
            ingredients: sectioned
                .iter()
                .filter(|l| l.recipe_section_id == Some(section.id))
                .cloned()
                .collect(),
            id: section.id,
            name: section.name,
            sort_order: section.sort_order,
            instructions: section.instructions,
        })
        .collect();

    let times_planned = Recipe::times_planned(conn, recipe.id)?;

    Ok(RecipeDetail {
        recipe,
        ingredients,
        sections,
        times_planned,
    })
}

/// Create a recipe with its ingredient lines in one transaction
pub fn create_recipe(
    db: &Database,
    data: RecipeCreate,
    ingredients: Option<Vec<IngredientLine>>,
    sections: Option<Vec<SectionInput>>,
) -> Result<RecipeDetail, String> {
    db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let recipe = Recipe::create(&tx, &data)?;
        replace_recipe_ingredients(&tx, recipe.id, ingredients.as_deref(), sections.as_deref())?;
        let detail = load_detail(&tx, recipe)?;
        tx.commit()?;
        Ok(detail)
    })
    .map_err(|e| format!("Failed to create recipe: {}", e))
}

pub fn get_recipe(db: &Database, id: i64) -> Result<Option<RecipeDetail>, String> {
    db.with_conn(|conn| match Recipe::get_by_id(conn, id)? {
        Some(recipe) => load_detail(conn, recipe).map(Some),
        None => Ok(None),
    })
    .map_err(|e| format!("Failed to get recipe: {}", e))
}

/// List recipes, optionally filtered by name and meal type
pub fn list_recipes(
    db: &Database,
    query: Option<&str>,
    meal_type: Option<MealType>,
    limit: i64,
    offset: i64,
) -> Result<ListRecipesResponse, String> {
    let (limit, offset) = page(limit, offset);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, query, meal_type, limit, offset)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;
    let total = Recipe::count(&conn, query, meal_type).map_err(|e| format!("Failed to count recipes: {}", e))?;

    let mut summaries = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let ingredient_count = RecipeIngredient::count_for_recipe(&conn, recipe.id)
            .map_err(|e| format!("Failed to count ingredients: {}", e))?;
        summaries.push(RecipeSummary {
            id: recipe.id,
            name: recipe.name,
            servings: recipe.servings,
            meal_types: recipe.meal_types,
            flavor_profile: recipe.flavor_profile,
            ingredient_count,
        });
    }

    Ok(ListRecipesResponse {
        recipes: summaries,
        total,
        limit,
        offset,
    })
}

/// Update recipe metadata; ingredient lines are untouched
pub fn update_recipe(db: &Database, id: i64, data: RecipeUpdate) -> Result<Option<Recipe>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Recipe::update(&conn, id, &data).map_err(|e| format!("Failed to update recipe: {}", e))
}

/// Replace every ingredient line (and section) of a recipe
pub fn set_recipe_ingredients(
    db: &Database,
    id: i64,
    ingredients: Option<Vec<IngredientLine>>,
    sections: Option<Vec<SectionInput>>,
) -> Result<Option<RecipeDetail>, String> {
    db.with_conn_mut(|conn| {
        let Some(recipe) = Recipe::get_by_id(conn, id)? else {
            return Ok(None);
        };
        let tx = conn.transaction()?;
        replace_recipe_ingredients(&tx, id, ingredients.as_deref(), sections.as_deref())?;
        let detail = load_detail(&tx, recipe)?;
        tx.commit()?;
        Ok(Some(detail))
    })
    .map_err(|e| format!("Failed to set ingredients: {}", e))
}

/// Delete a recipe. While it is on a meal plan this needs `force`, which
/// also removes those assignments.
pub fn delete_recipe(
    db: &Database,
    id: i64,
    force: bool,
) -> Result<Result<DeleteResponse, RecipeDeleteBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .is_none()
    {
        return Err(format!("Recipe not found with id: {}", id));
    }

    let times_planned = Recipe::times_planned(&conn, id)
        .map_err(|e| format!("Failed to check meal plan usage: {}", e))?;
    if times_planned > 0 && !force {
        return Ok(Err(RecipeDeleteBlockedResponse {
            error: format!(
                "Cannot delete recipe: planned {} time(s). Pass force=true to remove it from those meal plans too.",
                times_planned
            ),
            times_planned,
        }));
    }

    Recipe::delete(&conn, id).map_err(|e| format!("Failed to delete recipe: {}", e))?;
    Ok(Ok(DeleteResponse::new(id)))
}
