//! Recipe section model
//!
//! Named, ordered parts of a recipe ("Crust", "Filling") each with their
//! own ingredient lines and optional instructions.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSection {
    pub id: i64,
    pub recipe_id: i64,
    pub name: String,
    pub sort_order: i64,
    pub instructions: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl RecipeSection {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            name: row.get("name")?,
            sort_order: row.get("sort_order")?,
            instructions: row.get("instructions")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(
        conn: &Connection,
        recipe_id: i64,
        name: &str,
        sort_order: i64,
        instructions: Option<&str>,
    ) -> DbResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DbError::invalid("Section name is required"));
        }

        conn.execute(
            "INSERT INTO recipe_sections (recipe_id, name, sort_order, instructions) VALUES (?1, ?2, ?3, ?4)",
            params![recipe_id, name, sort_order, instructions],
        )?;

        let id = conn.last_insert_rowid();
        let section = conn.query_row(
            "SELECT * FROM recipe_sections WHERE id = ?1",
            [id],
            Self::from_row,
        )?;
        Ok(section)
    }

    pub fn list_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_sections WHERE recipe_id = ?1 ORDER BY sort_order, id",
        )?;
        let sections = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sections)
    }

    pub fn delete_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<usize> {
        Ok(conn.execute("DELETE FROM recipe_sections WHERE recipe_id = ?1", [recipe_id])?)
    }
}
