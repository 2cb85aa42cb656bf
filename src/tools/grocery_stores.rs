//! Grocery store and aisle section tools

use serde::Serialize;

use crate::db::Database;
use crate::models::{GroceryStore, GroceryStoreSection, GroceryStoreSectionUpdate};
use super::DeleteResponse;

/// Store with its sections in walking order
#[derive(Debug, Serialize)]
pub struct GroceryStoreDetail {
    pub id: i64,
    pub name: String,
    pub sections: Vec<GroceryStoreSection>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListGroceryStoresResponse {
    pub stores: Vec<GroceryStoreDetail>,
    pub count: usize,
}

fn detail(conn: &rusqlite::Connection, store: GroceryStore) -> Result<GroceryStoreDetail, String> {
    let sections = GroceryStoreSection::list_for_store(conn, store.id)
        .map_err(|e| format!("Failed to get sections: {}", e))?;
    Ok(GroceryStoreDetail {
        id: store.id,
        name: store.name,
        sections,
        created_at: store.created_at,
        updated_at: store.updated_at,
    })
}

/// Create a store; sections are ordered as given, blank names skipped
pub fn create_grocery_store(db: &Database, name: &str, sections: Vec<String>) -> Result<GroceryStoreDetail, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let store = GroceryStore::create(&conn, name, &sections)
        .map_err(|e| format!("Failed to create grocery store: {}", e))?;
    detail(&conn, store)
}

pub fn get_grocery_store(db: &Database, id: i64) -> Result<Option<GroceryStoreDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    match GroceryStore::get_by_id(&conn, id).map_err(|e| format!("Failed to get grocery store: {}", e))? {
        Some(store) => detail(&conn, store).map(Some),
        None => Ok(None),
    }
}

pub fn list_grocery_stores(db: &Database) -> Result<ListGroceryStoresResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let stores = GroceryStore::list(&conn)
        .map_err(|e| format!("Failed to list grocery stores: {}", e))?
        .into_iter()
        .map(|store| detail(&conn, store))
        .collect::<Result<Vec<_>, _>>()?;
    let count = stores.len();
    Ok(ListGroceryStoresResponse { stores, count })
}

pub fn rename_grocery_store(db: &Database, id: i64, name: &str) -> Result<Option<GroceryStore>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    GroceryStore::rename(&conn, id, name).map_err(|e| format!("Failed to rename grocery store: {}", e))
}

/// Ingredient defaults and item overrides pointing at the store are cleared
pub fn delete_grocery_store(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = GroceryStore::delete(&conn, id)
        .map_err(|e| format!("Failed to delete grocery store: {}", e))?;
    Ok(deleted.then(|| DeleteResponse::new(id)))
}

pub fn add_store_section(
    db: &Database,
    grocery_store_id: i64,
    name: &str,
    sort_order: Option<i64>,
) -> Result<GroceryStoreSection, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    GroceryStoreSection::create(&conn, grocery_store_id, name, sort_order)
        .map_err(|e| format!("Failed to add section: {}", e))
}

pub fn update_store_section(
    db: &Database,
    id: i64,
    data: GroceryStoreSectionUpdate,
) -> Result<Option<GroceryStoreSection>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    GroceryStoreSection::update(&conn, id, &data).map_err(|e| format!("Failed to update section: {}", e))
}

pub fn delete_store_section(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = GroceryStoreSection::delete(&conn, id)
        .map_err(|e| format!("Failed to delete section: {}", e))?;
    Ok(deleted.then(|| DeleteResponse::new(id)))
}
