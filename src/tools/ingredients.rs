//! Ingredient tools

use serde::Serialize;

use crate::db::Database;
use crate::models::{GroceryStore, GroceryStoreSection, Ingredient, IngredientCreate, IngredientUpdate};
use super::{page, DeleteResponse};

/// Ingredient with its default store/section names and usage
#[derive(Debug, Serialize)]
pub struct IngredientDetail {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub grocery_store_name: Option<String>,
    pub grocery_store_section_name: Option<String>,
    pub usage_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ListIngredientsResponse {
    pub ingredients: Vec<Ingredient>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for delete blocked
#[derive(Debug, Serialize)]
pub struct IngredientDeleteBlockedResponse {
    pub error: String,
    pub usage_count: i64,
}

pub fn add_ingredient(db: &Database, data: IngredientCreate) -> Result<Ingredient, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Ingredient::create(&conn, &data).map_err(|e| format!("Failed to create ingredient: {}", e))
}

pub fn get_ingredient(db: &Database, id: i64) -> Result<Option<IngredientDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(ingredient) = Ingredient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
    else {
        return Ok(None);
    };

    let grocery_store_name = match ingredient.grocery_store_id {
        Some(store_id) => GroceryStore::get_by_id(&conn, store_id)
            .map_err(|e| format!("Database error: {}", e))?
            .map(|s| s.name),
        None => None,
    };
    let grocery_store_section_name = match ingredient.grocery_store_section_id {
        Some(section_id) => GroceryStoreSection::get_by_id(&conn, section_id)
            .map_err(|e| format!("Database error: {}", e))?
            .map(|s| s.name),
        None => None,
    };
    let usage_count = Ingredient::usage_count(&conn, id)
        .map_err(|e| format!("Failed to check usage: {}", e))?;

    Ok(Some(IngredientDetail {
        ingredient,
        grocery_store_name,
        grocery_store_section_name,
        usage_count,
    }))
}

pub fn list_ingredients(
    db: &Database,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListIngredientsResponse, String> {
    let (limit, offset) = page(limit, offset);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredients = Ingredient::list(&conn, query, limit, offset)
        .map_err(|e| format!("Failed to list ingredients: {}", e))?;
    let total = Ingredient::count(&conn, query).map_err(|e| format!("Failed to count ingredients: {}", e))?;

    Ok(ListIngredientsResponse {
        ingredients,
        total,
        limit,
        offset,
    })
}

pub fn update_ingredient(db: &Database, id: i64, data: IngredientUpdate) -> Result<Option<Ingredient>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Ingredient::update(&conn, id, &data).map_err(|e| format!("Failed to update ingredient: {}", e))
}

/// Delete an ingredient (blocked while recipes or shopping lists use it)
pub fn delete_ingredient(
    db: &Database,
    id: i64,
) -> Result<Result<DeleteResponse, IngredientDeleteBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if Ingredient::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .is_none()
    {
        return Err(format!("Ingredient not found with id: {}", id));
    }

    let usage_count = Ingredient::usage_count(&conn, id)
        .map_err(|e| format!("Failed to check usage: {}", e))?;
    if usage_count > 0 {
        return Ok(Err(IngredientDeleteBlockedResponse {
            error: format!("Cannot delete ingredient: used {} time(s) in recipes or shopping lists", usage_count),
            usage_count,
        }));
    }

    Ingredient::delete(&conn, id).map_err(|e| format!("Failed to delete ingredient: {}", e))?;
    Ok(Ok(DeleteResponse::new(id)))
}
