//! Shopping list model
//!
//! One list per meal plan. Creating a list fills it from the plan's recipes;
//! regenerating throws the items away and builds them again.

use std::fmt;

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::shopping::PlanSnapshot;
use super::{MealPlan, ShoppingListItem};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Manual,
    Alphabetical,
    Store,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Manual => "manual",
            DisplayMode::Alphabetical => "alphabetical",
            DisplayMode::Store => "store",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Some(DisplayMode::Manual),
            "alphabetical" => Some(DisplayMode::Alphabetical),
            "store" => Some(DisplayMode::Store),
            _ => None,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: i64,
    pub meal_plan_id: i64,
    pub display_mode: DisplayMode,
    pub created_at: String,
    pub updated_at: String,
}

impl ShoppingList {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let mode: String = row.get("display_mode")?;
        Ok(Self {
            id: row.get("id")?,
            meal_plan_id: row.get("meal_plan_id")?,
            display_mode: DisplayMode::parse(&mode).unwrap_or_default(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Create the plan's list and fill it with generated items
    pub fn create_for_plan(
        conn: &mut Connection,
        meal_plan_id: i64,
        display_mode: DisplayMode,
    ) -> DbResult<Self> {
        if MealPlan::get_by_id(conn, meal_plan_id)?.is_none() {
            return Err(DbError::invalid(format!("Meal plan {} not found", meal_plan_id)));
        }
        if Self::get_for_plan(conn, meal_plan_id)?.is_some() {
            return Err(DbError::invalid(format!(
                "Meal plan {} already has a shopping list",
                meal_plan_id
            )));
        }

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO shopping_lists (meal_plan_id, display_mode) VALUES (?1, ?2)",
            params![meal_plan_id, display_mode.as_str()],
        )?;
        let id = tx.last_insert_rowid();
        let written = populate(&tx, id, meal_plan_id)?;
        tx.commit()?;

        tracing::info!(shopping_list_id = id, meal_plan_id, items = written, "created shopping list");
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        Ok(conn
            .query_row("SELECT * FROM shopping_lists WHERE id = ?1", [id], Self::from_row)
            .optional()?)
    }

    pub fn get_for_plan(conn: &Connection, meal_plan_id: i64) -> DbResult<Option<Self>> {
        Ok(conn
            .query_row(
                "SELECT * FROM shopping_lists WHERE meal_plan_id = ?1",
                [meal_plan_id],
                Self::from_row,
            )
            .optional()?)
    }

    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM shopping_lists ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let lists = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    pub fn set_display_mode(conn: &Connection, id: i64, mode: DisplayMode) -> DbResult<Option<Self>> {
        conn.execute(
            "UPDATE shopping_lists SET display_mode = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![mode.as_str(), id],
        )?;
        Self::get_by_id(conn, id)
    }

    /// Replace every item with a fresh generation from the meal plan.
    /// Manual edits, added items and purchased flags are discarded.
    /// Returns the number of items written, `None` for an unknown list.
    pub fn regenerate(conn: &mut Connection, id: i64) -> DbResult<Option<usize>> {
        let Some(list) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let tx = conn.transaction()?;
        let removed = ShoppingListItem::delete_for_list(&tx, id)?;
        let written = populate(&tx, id, list.meal_plan_id)?;
        tx.execute(
            "UPDATE shopping_lists SET updated_at = datetime('now') WHERE id = ?1",
            [id],
        )?;
        tx.commit()?;

        tracing::info!(shopping_list_id = id, removed, written, "regenerated shopping list");
        Ok(Some(written))
    }

    /// Items cascade
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM shopping_lists WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

fn populate(conn: &Connection, shopping_list_id: i64, meal_plan_id: i64) -> DbResult<usize> {
    let snapshot = PlanSnapshot::load(conn, meal_plan_id)?
        .ok_or_else(|| DbError::invalid(format!("Meal plan {} not found", meal_plan_id)))?;
    let items = snapshot.generate();
    ShoppingListItem::insert_generated(conn, shopping_list_id, &items)
}
