//! Shopping list tools
//!
//! Lists are generated from a meal plan, then edited by hand. Items are
//! returned in the list's display mode; store mode also groups them by
//! store and aisle section.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{Database, DbResult};
use crate::models::{
    DisplayMode, MealPlan, ShoppingList, ShoppingListItem, ShoppingListItemCreate,
    ShoppingListItemDetail, ShoppingListItemUpdate,
};
use crate::shopping::{group_by_store, order_items, ItemGroup, LineItem, PlanSnapshot};
use super::DeleteResponse;

/// A shopping list as shown to the user
#[derive(Debug, Serialize)]
pub struct ShoppingListView {
    pub id: i64,
    pub meal_plan_id: i64,
    pub meal_plan_name: String,
    pub display_mode: DisplayMode,
    pub item_count: usize,
    pub purchased_count: usize,
    pub items: Vec<ShoppingListItemDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<ItemGroup<ShoppingListItemDetail>>>,
}

#[derive(Debug, Serialize)]
pub struct ListShoppingListsResponse {
    pub shopping_lists: Vec<ShoppingList>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ReorderItemsResponse {
    pub success: bool,
    pub updated: usize,
}

/// Items the plan would produce right now, without touching storage
#[derive(Debug, Serialize)]
pub struct ShoppingListPreview {
    pub meal_plan_id: i64,
    pub assignment_count: usize,
    pub item_count: usize,
    pub items: Vec<LineItem>,
}

fn build_view(conn: &Connection, list: ShoppingList) -> DbResult<ShoppingListView> {
    let meal_plan_name = MealPlan::get_by_id(conn, list.meal_plan_id)?
        .map(|plan| plan.name)
        .unwrap_or_default();

    let mut items = ShoppingListItem::list_details(conn, list.id)?;
    order_items(&mut items, list.display_mode);
    let purchased_count = items.iter().filter(|i| i.is_purchased).count();

    let groups = match list.display_mode {
        DisplayMode::Store => Some(group_by_store(items.clone())),
        _ => None,
    };

    Ok(ShoppingListView {
        id: list.id,
        meal_plan_id: list.meal_plan_id,
        meal_plan_name,
        display_mode: list.display_mode,
        item_count: items.len(),
        purchased_count,
        items,
        groups,
    })
}

/// Create the meal plan's shopping list and fill it from the plan's recipes
pub fn create_shopping_list(
    db: &Database,
    meal_plan_id: i64,
    display_mode: DisplayMode,
) -> Result<ShoppingListView, String> {
    db.with_conn_mut(|conn| {
        let list = ShoppingList::create_for_plan(conn, meal_plan_id, display_mode)?;
        build_view(conn, list)
    })
    .map_err(|e| format!("Failed to create shopping list: {}", e))
}

pub fn get_shopping_list(db: &Database, id: i64) -> Result<Option<ShoppingListView>, String> {
    db.with_conn(|conn| match ShoppingList::get_by_id(conn, id)? {
        Some(list) => build_view(conn, list).map(Some),
        None => Ok(None),
    })
    .map_err(|e| format!("Failed to get shopping list: {}", e))
}

pub fn get_shopping_list_for_plan(db: &Database, meal_plan_id: i64) -> Result<Option<ShoppingListView>, String> {
    db.with_conn(|conn| match ShoppingList::get_for_plan(conn, meal_plan_id)? {
        Some(list) => build_view(conn, list).map(Some),
        None => Ok(None),
    })
    .map_err(|e| format!("Failed to get shopping list: {}", e))
}

pub fn list_shopping_lists(db: &Database, limit: i64, offset: i64) -> Result<ListShoppingListsResponse, String> {
    let (limit, offset) = super::page(limit, offset);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let shopping_lists = ShoppingList::list(&conn, limit, offset)
        .map_err(|e| format!("Failed to list shopping lists: {}", e))?;
    let count = shopping_lists.len();
    Ok(ListShoppingListsResponse { shopping_lists, count })
}

pub fn set_display_mode(db: &Database, id: i64, mode: DisplayMode) -> Result<Option<ShoppingListView>, String> {
    db.with_conn(|conn| match ShoppingList::set_display_mode(conn, id, mode)? {
        Some(list) => build_view(conn, list).map(Some),
        None => Ok(None),
    })
    .map_err(|e| format!("Failed to set display mode: {}", e))
}

/// Rebuild every item from the meal plan; manual edits are lost
pub fn regenerate_shopping_list(db: &Database, id: i64) -> Result<Option<ShoppingListView>, String> {
    db.with_conn_mut(|conn| {
        if ShoppingList::regenerate(conn, id)?.is_none() {
            return Ok(None);
        }
        match ShoppingList::get_by_id(conn, id)? {
            Some(list) => build_view(conn, list).map(Some),
            None => Ok(None),
        }
    })
    .map_err(|e| format!("Failed to regenerate shopping list: {}", e))
}

pub fn delete_shopping_list(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = ShoppingList::delete(&conn, id).map_err(|e| format!("Failed to delete shopping list: {}", e))?;
    Ok(deleted.then(|| DeleteResponse::new(id)))
}

/// Run the aggregator for a meal plan without storing anything
pub fn preview_shopping_list(db: &Database, meal_plan_id: i64) -> Result<Option<ShoppingListPreview>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let Some(snapshot) = PlanSnapshot::load(&conn, meal_plan_id)
        .map_err(|e| format!("Failed to load meal plan: {}", e))?
    else {
        return Ok(None);
    };

    let items = snapshot.generate();
    Ok(Some(ShoppingListPreview {
        meal_plan_id,
        assignment_count: snapshot.assignments.len(),
        item_count: items.len(),
        items,
    }))
}

// ============================================================================
// Item Tools
// ============================================================================

pub fn add_shopping_list_item(
    db: &Database,
    shopping_list_id: i64,
    data: ShoppingListItemCreate,
) -> Result<ShoppingListItemDetail, String> {
    db.with_conn(|conn| {
        if ShoppingList::get_by_id(conn, shopping_list_id)?.is_none() {
            return Err(crate::db::DbError::invalid(format!(
                "Shopping list {} not found",
                shopping_list_id
            )));
        }
        let item = ShoppingListItem::create(conn, shopping_list_id, &data)?;
        ShoppingListItem::get_detail(conn, item.id)?
            .ok_or(crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    })
    .map_err(|e| format!("Failed to add item: {}", e))
}

pub fn update_shopping_list_item(
    db: &Database,
    id: i64,
    data: ShoppingListItemUpdate,
) -> Result<Option<ShoppingListItemDetail>, String> {
    db.with_conn(|conn| match ShoppingListItem::update(conn, id, &data)? {
        Some(item) => ShoppingListItem::get_detail(conn, item.id),
        None => Ok(None),
    })
    .map_err(|e| format!("Failed to update item: {}", e))
}

pub fn delete_shopping_list_item(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let deleted = ShoppingListItem::delete(&conn, id).map_err(|e| format!("Failed to delete item: {}", e))?;
    Ok(deleted.then(|| DeleteResponse::new(id)))
}

/// Apply manual positions; all ids must be on the list or nothing changes
pub fn reorder_shopping_list_items(
    db: &Database,
    shopping_list_id: i64,
    positions: Vec<(i64, i64)>,
) -> Result<ReorderItemsResponse, String> {
    let updated = db
        .with_conn_mut(|conn| ShoppingListItem::reorder(conn, shopping_list_id, &positions))
        .map_err(|e| format!("Failed to reorder items: {}", e))?;
    Ok(ReorderItemsResponse { success: true, updated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_database;

    /// Plan with one dinner of a two-ingredient recipe, milk sorted into a store
    fn seeded(db: &Database) -> i64 {
        db.with_conn(|conn| {
            conn.execute_batch(
                r#"
                INSERT INTO grocery_stores (id, name) VALUES (1, 'Market');
                INSERT INTO grocery_store_sections (id, grocery_store_id, name, sort_order) VALUES (1, 1, 'Dairy', 1);
                INSERT INTO ingredients (id, name, grocery_store_id, grocery_store_section_id) VALUES (1, 'milk', 1, 1);
                INSERT INTO ingredients (id, name) VALUES (2, 'Bread');
                INSERT INTO recipes (id, name, servings, meal_types) VALUES (1, 'French Toast', 2, '["Breakfast"]');
                INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, unit) VALUES (1, 1, 0.5, 'cup');
                INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, unit) VALUES (1, 2, 4, 'slice');
                INSERT INTO meal_plans (id, name, start_date, end_date) VALUES (1, 'Week', '2026-01-20', '2026-01-26');
                INSERT INTO meal_plan_recipes (meal_plan_id, recipe_id, date, meal_type, servings)
                    VALUES (1, 1, '2026-01-21', 'Breakfast', 4);
                "#,
            )?;
            Ok(1)
        })
        .unwrap()
    }

    #[test]
    fn preview_matches_created_list() {
        let (_dir, db) = test_database();
        let plan_id = seeded(&db);

        let preview = preview_shopping_list(&db, plan_id).unwrap().unwrap();
        assert_eq!(preview.item_count, 2);
        assert!(get_shopping_list_for_plan(&db, plan_id).unwrap().is_none());

        let view = create_shopping_list(&db, plan_id, DisplayMode::Manual).unwrap();
        let quantities: Vec<_> = view.items.iter().map(|i| (i.ingredient_name.clone(), i.quantity)).collect();
        assert_eq!(quantities, vec![("Bread".to_string(), 8.0), ("milk".to_string(), 1.0)]);
        assert_eq!(view.meal_plan_name, "Week");
        assert!(view.groups.is_none());

        assert!(preview_shopping_list(&db, 999).unwrap().is_none());
    }

    #[test]
    fn store_mode_groups_and_places_unassigned_first() {
        let (_dir, db) = test_database();
        let plan_id = seeded(&db);
        let view = create_shopping_list(&db, plan_id, DisplayMode::Alphabetical).unwrap();
        assert_eq!(view.items[0].ingredient_name, "Bread");

        let view = set_display_mode(&db, view.id, DisplayMode::Store).unwrap().unwrap();
        assert_eq!(view.items[0].ingredient_name, "Bread");
        let groups = view.groups.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].grocery_store_id, None);
        assert_eq!(groups[1].grocery_store_section_name.as_deref(), Some("Dairy"));
    }

    #[test]
    fn manual_items_are_dropped_on_regenerate() {
        let (_dir, db) = test_database();
        let plan_id = seeded(&db);
        let view = create_shopping_list(&db, plan_id, DisplayMode::Manual).unwrap();

        let extra = ShoppingListItemCreate {
            ingredient_name: Some("Coffee".into()),
            quantity: 1.0,
            unit: "bag".into(),
            ..Default::default()
        };
        let added = add_shopping_list_item(&db, view.id, extra).unwrap();
        assert_eq!(added.sort_order, None);
        assert_eq!(get_shopping_list(&db, view.id).unwrap().unwrap().items.last().map(|i| i.id), Some(added.id));

        let reordered = reorder_shopping_list_items(&db, view.id, vec![(added.id, 1)]).unwrap();
        assert_eq!(reordered.updated, 1);
        assert!(reorder_shopping_list_items(&db, view.id, vec![(9999, 1)]).is_err());

        let regenerated = regenerate_shopping_list(&db, view.id).unwrap().unwrap();
        assert_eq!(regenerated.item_count, 2);
        assert!(regenerated.items.iter().all(|i| i.ingredient_name != "Coffee"));
    }
}
