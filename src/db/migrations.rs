//! Database migrations
//!
//! Versioned schema creation, tracked in `schema_migrations`.

use rusqlite::Connection;

use super::connection::DbResult;

const SCHEMA_VERSION: i32 = 2;

/// Bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current = get_schema_version(conn)?;

    if current < 1 {
        migrate_v1(conn)?;
        record_version(conn, 1)?;
    }
    if current < 2 {
        migrate_v2(conn)?;
        record_version(conn, 2)?;
    }

    if current < SCHEMA_VERSION {
        tracing::info!(from = current, to = SCHEMA_VERSION, "applied schema migrations");
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32) -> DbResult<()> {
    conn.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [version])?;
    Ok(())
}

/// v1: catalogue, recipes, meal plans and shopping lists
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE grocery_stores (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE grocery_store_sections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            grocery_store_id INTEGER NOT NULL REFERENCES grocery_stores(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(grocery_store_id, name)
        );

        CREATE TABLE ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            grocery_store_id INTEGER REFERENCES grocery_stores(id) ON DELETE SET NULL,
            grocery_store_section_id INTEGER REFERENCES grocery_store_sections(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            instructions TEXT NOT NULL DEFAULT '',
            servings INTEGER NOT NULL DEFAULT 1,   -- base serving count
            flavor_profile TEXT NOT NULL DEFAULT '',
            meal_types TEXT NOT NULL DEFAULT '[]', -- JSON array
            prep_time_minutes INTEGER,
            cook_time_minutes INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipes_name ON recipes(name);

        CREATE TABLE meal_plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            start_date TEXT NOT NULL,            -- YYYY-MM-DD
            end_date TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE meal_plan_recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_plan_id INTEGER NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            meal_type TEXT NOT NULL CHECK(meal_type IN ('Breakfast', 'Lunch', 'Dinner')),
            servings INTEGER NOT NULL CHECK(servings >= 1),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(meal_plan_id, date, meal_type)
        );

        CREATE INDEX idx_meal_plan_recipes_recipe ON meal_plan_recipes(recipe_id);

        CREATE TABLE shopping_lists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_plan_id INTEGER NOT NULL UNIQUE REFERENCES meal_plans(id) ON DELETE CASCADE,
            display_mode TEXT NOT NULL DEFAULT 'manual'
                CHECK(display_mode IN ('manual', 'alphabetical', 'store')),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE shopping_list_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            shopping_list_id INTEGER NOT NULL REFERENCES shopping_lists(id) ON DELETE CASCADE,
            ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
            grocery_store_id INTEGER REFERENCES grocery_stores(id) ON DELETE SET NULL,
            grocery_store_section_id INTEGER REFERENCES grocery_store_sections(id) ON DELETE SET NULL,
            quantity REAL NOT NULL,
            unit TEXT NOT NULL,
            is_purchased INTEGER NOT NULL DEFAULT 0,
            sort_order INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_shopping_list_items_order ON shopping_list_items(shopping_list_id, sort_order);
        CREATE INDEX idx_shopping_list_items_ingredient ON shopping_list_items(ingredient_id);
        "#,
    )?;

    Ok(())
}

/// v2: recipe sections; the ingredient pivot gets its own id so an
/// ingredient can appear more than once in a recipe
fn migrate_v2(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE recipe_sections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            instructions TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipe_sections_order ON recipe_sections(recipe_id, sort_order);

        CREATE TABLE recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
            recipe_section_id INTEGER REFERENCES recipe_sections(id) ON DELETE SET NULL,
            quantity REAL NOT NULL,
            unit TEXT NOT NULL,
            note TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
        CREATE INDEX idx_recipe_ingredients_ingredient ON recipe_ingredients(ingredient_id);
        "#,
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    Ok(get_schema_version(conn)? < SCHEMA_VERSION)
}

/// Fresh in-memory database with the full schema applied
#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    run_migrations(&conn).unwrap();
    conn
}
