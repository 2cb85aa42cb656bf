//! Ingredient model
//!
//! A named ingredient with an optional default store and aisle section.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::contains_pattern;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub grocery_store_id: Option<i64>,
    pub grocery_store_section_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientCreate {
    pub name: String,
    pub grocery_store_id: Option<i64>,
    pub grocery_store_section_id: Option<i64>,
}

/// `Some(None)` clears a default store or section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientUpdate {
    pub name: Option<String>,
    pub grocery_store_id: Option<Option<i64>>,
    pub grocery_store_section_id: Option<Option<i64>>,
}

impl Ingredient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            grocery_store_id: row.get("grocery_store_id")?,
            grocery_store_section_id: row.get("grocery_store_section_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &IngredientCreate) -> DbResult<Self> {
        let name = normalize_name(&data.name)?;
        if Self::get_by_name(conn, &name)?.is_some() {
            return Err(DbError::invalid(format!("Ingredient '{}' already exists", name)));
        }

        conn.execute(
            "INSERT INTO ingredients (name, grocery_store_id, grocery_store_section_id) VALUES (?1, ?2, ?3)",
            params![name, data.grocery_store_id, data.grocery_store_section_id],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Look an ingredient up by name (case-insensitive), creating it if needed
    pub fn find_or_create(conn: &Connection, name: &str) -> DbResult<Self> {
        let name = normalize_name(name)?;
        match Self::get_by_name(conn, &name)? {
            Some(existing) => Ok(existing),
            None => Self::create(
                conn,
                &IngredientCreate {
                    name,
                    ..Default::default()
                },
            ),
        }
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let ingredient = conn
            .query_row("SELECT * FROM ingredients WHERE id = ?1", [id], Self::from_row)
            .optional()?;
        Ok(ingredient)
    }

    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let ingredient = conn
            .query_row(
                "SELECT * FROM ingredients WHERE name = ?1 COLLATE NOCASE",
                [name.trim()],
                Self::from_row,
            )
            .optional()?;
        Ok(ingredient)
    }

    /// List ingredients by name, optionally filtered by a substring
    pub fn list(conn: &Connection, query: Option<&str>, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let pattern = contains_pattern(query);
        let mut stmt = conn.prepare(
            r"SELECT * FROM ingredients WHERE name LIKE ?1 ESCAPE '\' ORDER BY name COLLATE NOCASE LIMIT ?2 OFFSET ?3",
        )?;
        let ingredients = stmt
            .query_map(params![pattern, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    /// Number of ingredients matching the same filter as `list`
    pub fn count(conn: &Connection, query: Option<&str>) -> DbResult<i64> {
        Ok(conn.query_row(
            r"SELECT COUNT(*) FROM ingredients WHERE name LIKE ?1 ESCAPE '\'",
            [contains_pattern(query)],
            |row| row.get(0),
        )?)
    }

    pub fn update(conn: &Connection, id: i64, data: &IngredientUpdate) -> DbResult<Option<Self>> {
        let Some(current) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let name = match &data.name {
            Some(name) => {
                let name = normalize_name(name)?;
                if let Some(other) = Self::get_by_name(conn, &name)? {
                    if other.id != id {
                        return Err(DbError::invalid(format!("Ingredient '{}' already exists", name)));
                    }
                }
                name
            }
            None => current.name,
        };
        let store_id = data.grocery_store_id.unwrap_or(current.grocery_store_id);
        let section_id = data
            .grocery_store_section_id
            .unwrap_or(current.grocery_store_section_id);

        conn.execute(
            r#"
            UPDATE ingredients
            SET name = ?1, grocery_store_id = ?2, grocery_store_section_id = ?3,
                updated_at = datetime('now')
            WHERE id = ?4
            "#,
            params![name, store_id, section_id, id],
        )?;

        Self::get_by_id(conn, id)
    }

    /// Number of recipe lines and shopping list items referencing the ingredient
    pub fn usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            r#"
            SELECT (SELECT COUNT(*) FROM recipe_ingredients WHERE ingredient_id = ?1)
                 + (SELECT COUNT(*) FROM shopping_list_items WHERE ingredient_id = ?1)
            "#,
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

fn normalize_name(name: &str) -> DbResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::invalid("Ingredient name cannot be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::test_connection;

    #[test]
    fn find_or_create_reuses_names_case_insensitively() {
        let conn = test_connection();
        let first = Ingredient::find_or_create(&conn, "  Garlic ").unwrap();
        let second = Ingredient::find_or_create(&conn, "garlic").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.name, "Garlic");
        assert_eq!(Ingredient::count(&conn, None).unwrap(), 1);
    }

    #[test]
    fn create_rejects_blank_and_duplicate_names() {
        let conn = test_connection();
        let blank = IngredientCreate { name: "  ".into(), ..Default::default() };
        assert!(matches!(Ingredient::create(&conn, &blank), Err(DbError::Invalid(_))));

        let flour = IngredientCreate { name: "Flour".into(), ..Default::default() };
        Ingredient::create(&conn, &flour).unwrap();
        let again = IngredientCreate { name: "FLOUR".into(), ..Default::default() };
        assert!(matches!(Ingredient::create(&conn, &again), Err(DbError::Invalid(_))));
    }

    #[test]
    fn update_can_clear_defaults() {
        let conn = test_connection();
        conn.execute("INSERT INTO grocery_stores (name) VALUES ('Market')", []).unwrap();
        let store_id = conn.last_insert_rowid();

        let created = Ingredient::create(
            &conn,
            &IngredientCreate { name: "Milk".into(), grocery_store_id: Some(store_id), grocery_store_section_id: None },
        )
        .unwrap();
        assert_eq!(created.grocery_store_id, Some(store_id));

        let renamed = Ingredient::update(
            &conn,
            created.id,
            &IngredientUpdate { name: Some("Whole milk".into()), ..Default::default() },
        )
        .unwrap()
        .unwrap();
        assert_eq!(renamed.grocery_store_id, Some(store_id));

        let cleared = Ingredient::update(
            &conn,
            created.id,
            &IngredientUpdate { grocery_store_id: Some(None), ..Default::default() },
        )
        .unwrap()
        .unwrap();
        assert_eq!(cleared.name, "Whole milk");
        assert_eq!(cleared.grocery_store_id, None);
    }

    #[test]
    fn list_filters_by_substring() {
        let conn = test_connection();
        for name in ["red onion", "Onion powder", "basil"] {
            Ingredient::find_or_create(&conn, name).unwrap();
        }
        let names: Vec<String> = Ingredient::list(&conn, Some("onion"), 50, 0)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Onion powder", "red onion"]);
    }
}
