//! Grocery store and aisle section models

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryStore {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// An aisle or department inside a store, walked in `sort_order`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryStoreSection {
    pub id: i64,
    pub grocery_store_id: i64,
    pub name: String,
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroceryStoreSectionUpdate {
    pub name: Option<String>,
    pub sort_order: Option<i64>,
}

impl GroceryStore {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Create a store together with its sections; blank section names are
    /// dropped and the rest are numbered in the order given
    pub fn create(conn: &Connection, name: &str, section_names: &[String]) -> DbResult<Self> {
        let name = required(name, "Grocery store name")?;
        if Self::get_by_name(conn, &name)?.is_some() {
            return Err(DbError::invalid(format!("Grocery store '{}' already exists", name)));
        }

        conn.execute("INSERT INTO grocery_stores (name) VALUES (?1)", [&name])?;
        let id = conn.last_insert_rowid();

        let names = section_names.iter().map(|s| s.trim()).filter(|s| !s.is_empty());
        for (position, section) in names.enumerate() {
            GroceryStoreSection::create(conn, id, section, Some(position as i64 + 1))?;
        }

        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        Ok(conn
            .query_row("SELECT * FROM grocery_stores WHERE id = ?1", [id], Self::from_row)
            .optional()?)
    }

    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        Ok(conn
            .query_row(
                "SELECT * FROM grocery_stores WHERE name = ?1 COLLATE NOCASE",
                [name.trim()],
                Self::from_row,
            )
            .optional()?)
    }

    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM grocery_stores ORDER BY name COLLATE NOCASE")?;
        let stores = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stores)
    }

    pub fn rename(conn: &Connection, id: i64, name: &str) -> DbResult<Option<Self>> {
        let name = required(name, "Grocery store name")?;
        if let Some(other) = Self::get_by_name(conn, &name)? {
            if other.id != id {
                return Err(DbError::invalid(format!("Grocery store '{}' already exists", name)));
            }
        }
        conn.execute(
            "UPDATE grocery_stores SET name = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![name, id],
        )?;
        Self::get_by_id(conn, id)
    }

    /// Sections cascade; ingredients and list items lose the reference
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM grocery_stores WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

impl GroceryStoreSection {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            grocery_store_id: row.get("grocery_store_id")?,
            name: row.get("name")?,
            sort_order: row.get("sort_order")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Add a section; without an explicit position it goes to the end
    pub fn create(
        conn: &Connection,
        grocery_store_id: i64,
        name: &str,
        sort_order: Option<i64>,
    ) -> DbResult<Self> {
        let name = required(name, "Section name")?;
        if GroceryStore::get_by_id(conn, grocery_store_id)?.is_none() {
            return Err(DbError::invalid(format!("Grocery store {} not found", grocery_store_id)));
        }
        if Self::exists_in_store(conn, grocery_store_id, &name, None)? {
            return Err(DbError::invalid(format!("Section '{}' already exists in this store", name)));
        }

        let sort_order = match sort_order {
            Some(position) => position,
            None => conn.query_row(
                "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM grocery_store_sections WHERE grocery_store_id = ?1",
                [grocery_store_id],
                |row| row.get(0),
            )?,
        };

        conn.execute(
            "INSERT INTO grocery_store_sections (grocery_store_id, name, sort_order) VALUES (?1, ?2, ?3)",
            params![grocery_store_id, name, sort_order],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        Ok(conn
            .query_row("SELECT * FROM grocery_store_sections WHERE id = ?1", [id], Self::from_row)
            .optional()?)
    }

    pub fn list_for_store(conn: &Connection, grocery_store_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM grocery_store_sections WHERE grocery_store_id = ?1 ORDER BY sort_order, id",
        )?;
        let sections = stmt
            .query_map([grocery_store_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sections)
    }

    pub fn update(conn: &Connection, id: i64, data: &GroceryStoreSectionUpdate) -> DbResult<Option<Self>> {
        let Some(current) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let name = match &data.name {
            Some(name) => {
                let name = required(name, "Section name")?;
                if Self::exists_in_store(conn, current.grocery_store_id, &name, Some(id))? {
                    return Err(DbError::invalid(format!("Section '{}' already exists in this store", name)));
                }
                name
            }
            None => current.name,
        };
        let sort_order = data.sort_order.unwrap_or(current.sort_order);

        conn.execute(
            r#"
            UPDATE grocery_store_sections
            SET name = ?1, sort_order = ?2, updated_at = datetime('now')
            WHERE id = ?3
            "#,
            params![name, sort_order, id],
        )?;

        Self::get_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM grocery_store_sections WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    fn exists_in_store(conn: &Connection, store_id: i64, name: &str, except_id: Option<i64>) -> DbResult<bool> {
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM grocery_store_sections
            WHERE grocery_store_id = ?1 AND name = ?2 COLLATE NOCASE AND id != COALESCE(?3, -1)
            "#,
            params![store_id, name, except_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

fn required(value: &str, field: &str) -> DbResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DbError::invalid(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::test_connection;

    #[test]
    fn create_with_sections_skips_blank_names() {
        let conn = test_connection();
        let sections = vec!["Produce".to_string(), "  ".to_string(), "Dairy".to_string()];
        let store = GroceryStore::create(&conn, "Corner Market", &sections).unwrap();

        let listed = GroceryStoreSection::list_for_store(&conn, store.id).unwrap();
        let shape: Vec<(&str, i64)> = listed.iter().map(|s| (s.name.as_str(), s.sort_order)).collect();
        assert_eq!(shape, vec![("Produce", 1), ("Dairy", 2)]);
    }

    #[test]
    fn store_names_are_unique_and_required() {
        let conn = test_connection();
        GroceryStore::create(&conn, "Market", &[]).unwrap();
        assert!(matches!(GroceryStore::create(&conn, "market", &[]), Err(DbError::Invalid(_))));
        assert!(matches!(GroceryStore::create(&conn, " ", &[]), Err(DbError::Invalid(_))));
    }

    #[test]
    fn new_sections_append_after_existing_ones() {
        let conn = test_connection();
        let store = GroceryStore::create(&conn, "Market", &["Bakery".to_string()]).unwrap();
        let frozen = GroceryStoreSection::create(&conn, store.id, "Frozen", None).unwrap();
        assert_eq!(frozen.sort_order, 2);

        let duplicate = GroceryStoreSection::create(&conn, store.id, "bakery", None);
        assert!(matches!(duplicate, Err(DbError::Invalid(_))));
    }

    #[test]
    fn deleting_a_store_removes_sections_and_clears_ingredient_defaults() {
        let conn = test_connection();
        let store = GroceryStore::create(&conn, "Market", &["Produce".to_string()]).unwrap();
        let section = &GroceryStoreSection::list_for_store(&conn, store.id).unwrap()[0];
        conn.execute(
            "INSERT INTO ingredients (name, grocery_store_id, grocery_store_section_id) VALUES ('kale', ?1, ?2)",
            params![store.id, section.id],
        )
        .unwrap();

        assert!(GroceryStore::delete(&conn, store.id).unwrap());

        let (store_ref, section_ref): (Option<i64>, Option<i64>) = conn
            .query_row(
                "SELECT grocery_store_id, grocery_store_section_id FROM ingredients WHERE name = 'kale'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((store_ref, section_ref), (None, None));
        assert!(GroceryStoreSection::get_by_id(&conn, section.id).unwrap().is_none());
    }
}
