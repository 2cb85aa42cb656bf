//! Shopping list items
//!
//! An item may override its ingredient's default store and section; the
//! detail view resolves the effective placement used for store ordering.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::quantity::{round_quantity, to_fraction};
use crate::shopping::{ItemPlacement, LineItem, Placed};
use super::{GroceryStore, GroceryStoreSection, Ingredient};

const MIN_QUANTITY: f64 = 0.01;
const MAX_UNIT_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub id: i64,
    pub shopping_list_id: i64,
    pub ingredient_id: i64,
    pub grocery_store_id: Option<i64>,
    pub grocery_store_section_id: Option<i64>,
    pub quantity: f64,
    pub unit: String,
    pub is_purchased: bool,
    pub sort_order: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Item with ingredient name and effective store/section resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItemDetail {
    pub id: i64,
    pub shopping_list_id: i64,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub quantity: f64,
    pub display_quantity: String,
    pub unit: String,
    pub is_purchased: bool,
    pub sort_order: Option<i64>,
    pub grocery_store_id: Option<i64>,
    pub grocery_store_name: Option<String>,
    pub grocery_store_section_id: Option<i64>,
    pub grocery_store_section_name: Option<String>,
    #[serde(skip)]
    pub section_sort_order: Option<i64>,
    /// True when the store or section comes from the item, not the ingredient
    pub has_override: bool,
}

impl Placed for ShoppingListItemDetail {
    fn placement(&self) -> ItemPlacement<'_> {
        ItemPlacement {
            id: self.id,
            ingredient_name: &self.ingredient_name,
            sort_order: self.sort_order,
            is_purchased: self.is_purchased,
            store_id: self.grocery_store_id,
            store_name: self.grocery_store_name.as_deref(),
            section_id: self.grocery_store_section_id,
            section_name: self.grocery_store_section_name.as_deref(),
            section_sort_order: self.section_sort_order,
        }
    }
}

/// Manually added item; the ingredient is given by id or by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShoppingListItemCreate {
    pub ingredient_id: Option<i64>,
    pub ingredient_name: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub grocery_store_id: Option<i64>,
    pub grocery_store_section_id: Option<i64>,
    pub sort_order: Option<i64>,
}

/// `Some(None)` clears an override or the manual position
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShoppingListItemUpdate {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub is_purchased: Option<bool>,
    pub sort_order: Option<Option<i64>>,
    pub grocery_store_id: Option<Option<i64>>,
    pub grocery_store_section_id: Option<Option<i64>>,
}

const DETAIL_SELECT: &str = r#"
    SELECT sli.id, sli.shopping_list_id, sli.ingredient_id, i.name AS ingredient_name,
           sli.quantity, sli.unit, sli.is_purchased, sli.sort_order,
           COALESCE(sli.grocery_store_id, i.grocery_store_id) AS store_id,
           gs.name AS store_name,
           COALESCE(sli.grocery_store_section_id, i.grocery_store_section_id) AS section_id,
           gss.name AS section_name,
           gss.sort_order AS section_sort_order,
           (sli.grocery_store_id IS NOT NULL OR sli.grocery_store_section_id IS NOT NULL) AS has_override
    FROM shopping_list_items sli
    INNER JOIN ingredients i ON i.id = sli.ingredient_id
    LEFT JOIN grocery_stores gs ON gs.id = COALESCE(sli.grocery_store_id, i.grocery_store_id)
    LEFT JOIN grocery_store_sections gss
        ON gss.id = COALESCE(sli.grocery_store_section_id, i.grocery_store_section_id)
"#;

impl ShoppingListItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            shopping_list_id: row.get("shopping_list_id")?,
            ingredient_id: row.get("ingredient_id")?,
            grocery_store_id: row.get("grocery_store_id")?,
            grocery_store_section_id: row.get("grocery_store_section_id")?,
            quantity: row.get("quantity")?,
            unit: row.get("unit")?,
            is_purchased: row.get("is_purchased")?,
            sort_order: row.get("sort_order")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn detail_from_row(row: &Row) -> rusqlite::Result<ShoppingListItemDetail> {
        let quantity: f64 = row.get("quantity")?;
        Ok(ShoppingListItemDetail {
            id: row.get("id")?,
            shopping_list_id: row.get("shopping_list_id")?,
            ingredient_id: row.get("ingredient_id")?,
            ingredient_name: row.get("ingredient_name")?,
            quantity,
            display_quantity: to_fraction(quantity),
            unit: row.get("unit")?,
            is_purchased: row.get("is_purchased")?,
            sort_order: row.get("sort_order")?,
            grocery_store_id: row.get("store_id")?,
            grocery_store_name: row.get("store_name")?,
            grocery_store_section_id: row.get("section_id")?,
            grocery_store_section_name: row.get("section_name")?,
            section_sort_order: row.get("section_sort_order")?,
            has_override: row.get("has_override")?,
        })
    }

    pub fn create(conn: &Connection, shopping_list_id: i64, data: &ShoppingListItemCreate) -> DbResult<Self> {
        let ingredient_id = match (data.ingredient_id, data.ingredient_name.as_deref()) {
            (Some(id), _) => Ingredient::get_by_id(conn, id)?
                .ok_or_else(|| DbError::invalid(format!("Ingredient {} not found", id)))?
                .id,
            (None, Some(name)) => Ingredient::find_or_create(conn, name)?.id,
            (None, None) => return Err(DbError::invalid("ingredient_id or ingredient_name is required")),
        };
        let quantity = validate_quantity(data.quantity)?;
        let unit = validate_unit(&data.unit)?;
        validate_sort_order(data.sort_order)?;
        validate_placement(conn, data.grocery_store_id, data.grocery_store_section_id)?;

        conn.execute(
            r#"
            INSERT INTO shopping_list_items
                (shopping_list_id, ingredient_id, grocery_store_id, grocery_store_section_id,
                 quantity, unit, sort_order)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                shopping_list_id,
                ingredient_id,
                data.grocery_store_id,
                data.grocery_store_section_id,
                quantity,
                unit,
                data.sort_order,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        Ok(conn
            .query_row("SELECT * FROM shopping_list_items WHERE id = ?1", [id], Self::from_row)
            .optional()?)
    }

    pub fn get_detail(conn: &Connection, id: i64) -> DbResult<Option<ShoppingListItemDetail>> {
        Ok(conn
            .query_row(&format!("{} WHERE sli.id = ?1", DETAIL_SELECT), [id], Self::detail_from_row)
            .optional()?)
    }

    /// Details in storage order; callers apply the list's display mode
    pub fn list_details(conn: &Connection, shopping_list_id: i64) -> DbResult<Vec<ShoppingListItemDetail>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE sli.shopping_list_id = ?1 ORDER BY sli.id",
            DETAIL_SELECT
        ))?;
        let items = stmt
            .query_map([shopping_list_id], Self::detail_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn count_for_list(conn: &Connection, shopping_list_id: i64) -> DbResult<i64> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM shopping_list_items WHERE shopping_list_id = ?1",
            [shopping_list_id],
            |row| row.get(0),
        )?)
    }

    pub fn update(conn: &Connection, id: i64, data: &ShoppingListItemUpdate) -> DbResult<Option<Self>> {
        let Some(current) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let quantity = match data.quantity {
            Some(q) => validate_quantity(q)?,
            None => current.quantity,
        };
        let unit = match &data.unit {
            Some(u) => validate_unit(u)?,
            None => current.unit,
        };
        let sort_order = data.sort_order.unwrap_or(current.sort_order);
        validate_sort_order(sort_order)?;
        let store_id = data.grocery_store_id.unwrap_or(current.grocery_store_id);
        let section_id = data
            .grocery_store_section_id
            .unwrap_or(current.grocery_store_section_id);
        validate_placement(conn, store_id, section_id)?;
        let is_purchased = data.is_purchased.unwrap_or(current.is_purchased);

        conn.execute(
            r#"
            UPDATE shopping_list_items
            SET quantity = ?1, unit = ?2, sort_order = ?3, grocery_store_id = ?4,
                grocery_store_section_id = ?5, is_purchased = ?6, updated_at = datetime('now')
            WHERE id = ?7
            "#,
            params![quantity, unit, sort_order, store_id, section_id, is_purchased, id],
        )?;

        Self::get_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM shopping_list_items WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    pub fn delete_for_list(conn: &Connection, shopping_list_id: i64) -> DbResult<usize> {
        Ok(conn.execute(
            "DELETE FROM shopping_list_items WHERE shopping_list_id = ?1",
            [shopping_list_id],
        )?)
    }

    /// Store freshly generated lines; quantities are kept as generated
    pub fn insert_generated(conn: &Connection, shopping_list_id: i64, items: &[LineItem]) -> DbResult<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO shopping_list_items
                (shopping_list_id, ingredient_id, quantity, unit, is_purchased, sort_order)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;
        for item in items {
            stmt.execute(params![
                shopping_list_id,
                item.ingredient_id,
                item.quantity,
                item.unit,
                item.is_purchased,
                item.sort_order,
            ])?;
        }
        Ok(items.len())
    }

    /// Apply `(item id, sort_order)` pairs atomically. Every id must belong
    /// to the list; otherwise nothing changes.
    pub fn reorder(conn: &mut Connection, shopping_list_id: i64, positions: &[(i64, i64)]) -> DbResult<usize> {
        if positions.is_empty() {
            return Err(DbError::invalid("At least one item position is required"));
        }
        let tx = conn.transaction()?;
        for &(id, sort_order) in positions {
            validate_sort_order(Some(sort_order))?;
            let owner: Option<i64> = tx
                .query_row(
                    "SELECT shopping_list_id FROM shopping_list_items WHERE id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            if owner != Some(shopping_list_id) {
                return Err(DbError::invalid(format!(
                    "Item {} does not belong to shopping list {}",
                    id, shopping_list_id
                )));
            }
            tx.execute(
                "UPDATE shopping_list_items SET sort_order = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![sort_order, id],
            )?;
        }
        tx.commit()?;
        Ok(positions.len())
    }
}

fn validate_quantity(quantity: f64) -> DbResult<f64> {
    if !quantity.is_finite() || quantity < MIN_QUANTITY {
        return Err(DbError::invalid(format!("quantity must be at least {}", MIN_QUANTITY)));
    }
    Ok(round_quantity(quantity))
}

fn validate_unit(unit: &str) -> DbResult<String> {
    let unit = unit.trim();
    if unit.is_empty() {
        return Err(DbError::invalid("Unit is required"));
    }
    if unit.chars().count() > MAX_UNIT_LEN {
        return Err(DbError::invalid(format!("Unit may not exceed {} characters", MAX_UNIT_LEN)));
    }
    Ok(unit.to_string())
}

fn validate_sort_order(sort_order: Option<i64>) -> DbResult<()> {
    if sort_order.is_some_and(|s| s < 1) {
        return Err(DbError::invalid("sort_order must be at least 1"));
    }
    Ok(())
}

/// A section override must exist and, with a store override, belong to it
fn validate_placement(conn: &Connection, store_id: Option<i64>, section_id: Option<i64>) -> DbResult<()> {
    if let Some(store_id) = store_id {
        if GroceryStore::get_by_id(conn, store_id)?.is_none() {
            return Err(DbError::invalid(format!("Grocery store {} not found", store_id)));
        }
    }
    if let Some(section_id) = section_id {
        let section = GroceryStoreSection::get_by_id(conn, section_id)?
            .ok_or_else(|| DbError::invalid(format!("Grocery store section {} not found", section_id)))?;
        if store_id.is_some_and(|s| s != section.grocery_store_id) {
            return Err(DbError::invalid("Section does not belong to the selected store"));
        }
    }
    Ok(())
}
