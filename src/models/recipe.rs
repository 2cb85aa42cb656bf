//! Recipe model
//!
//! A dish with a base serving count. Ingredient lines live in
//! `recipe_ingredients`, optionally grouped into `recipe_sections`.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::{contains_pattern, MealType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub instructions: String,
    pub servings: i64,
    pub flavor_profile: String,
    pub meal_types: Vec<MealType>,
    pub prep_time_minutes: Option<i64>,
    pub cook_time_minutes: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default = "default_servings")]
    pub servings: i64,
    #[serde(default)]
    pub flavor_profile: String,
    pub meal_types: Vec<MealType>,
    pub prep_time_minutes: Option<i64>,
    pub cook_time_minutes: Option<i64>,
}

fn default_servings() -> i64 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub instructions: Option<String>,
    pub servings: Option<i64>,
    pub flavor_profile: Option<String>,
    pub meal_types: Option<Vec<MealType>>,
    pub prep_time_minutes: Option<i64>,
    pub cook_time_minutes: Option<i64>,
}

impl Recipe {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let meal_types: String = row.get("meal_types")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            instructions: row.get("instructions")?,
            servings: row.get("servings")?,
            flavor_profile: row.get("flavor_profile")?,
            meal_types: serde_json::from_str(&meal_types).unwrap_or_default(),
            prep_time_minutes: row.get("prep_time_minutes")?,
            cook_time_minutes: row.get("cook_time_minutes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &RecipeCreate) -> DbResult<Self> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(DbError::invalid("Recipe name cannot be empty"));
        }
        validate_servings(data.servings)?;
        validate_meal_types(&data.meal_types)?;
        validate_minutes(data.prep_time_minutes, "prep_time_minutes")?;
        validate_minutes(data.cook_time_minutes, "cook_time_minutes")?;

        conn.execute(
            r#"
            INSERT INTO recipes (name, instructions, servings, flavor_profile, meal_types,
                                 prep_time_minutes, cook_time_minutes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                name,
                data.instructions,
                data.servings,
                data.flavor_profile.trim(),
                encode_meal_types(&data.meal_types),
                data.prep_time_minutes,
                data.cook_time_minutes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        Ok(conn
            .query_row("SELECT * FROM recipes WHERE id = ?1", [id], Self::from_row)
            .optional()?)
    }

    /// List recipes by name, optionally filtered by a name substring and a
    /// meal type
    pub fn list(
        conn: &Connection,
        query: Option<&str>,
        meal_type: Option<MealType>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let pattern = contains_pattern(query);
        let meal_type_filter = meal_type_pattern(meal_type);

        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM recipes
            WHERE name LIKE ?1 ESCAPE '\' AND (?2 IS NULL OR meal_types LIKE ?2)
            ORDER BY name COLLATE NOCASE, id
            LIMIT ?3 OFFSET ?4
            "#,
        )?;
        let recipes = stmt
            .query_map(params![pattern, meal_type_filter, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    /// Number of recipes matching the same filters as `list`
    pub fn count(conn: &Connection, query: Option<&str>, meal_type: Option<MealType>) -> DbResult<i64> {
        Ok(conn.query_row(
            r#"
            SELECT COUNT(*) FROM recipes
            WHERE name LIKE ?1 ESCAPE '\' AND (?2 IS NULL OR meal_types LIKE ?2)
            "#,
            params![contains_pattern(query), meal_type_pattern(meal_type)],
            |row| row.get(0),
        )?)
    }

    pub fn update(conn: &Connection, id: i64, data: &RecipeUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(DbError::invalid("Recipe name cannot be empty"));
            }
            values.push(Box::new(name.to_string()));
            updates.push(format!("name = ?{}", values.len()));
        }
        if let Some(ref instructions) = data.instructions {
            values.push(Box::new(instructions.clone()));
            updates.push(format!("instructions = ?{}", values.len()));
        }
        if let Some(servings) = data.servings {
            validate_servings(servings)?;
            values.push(Box::new(servings));
            updates.push(format!("servings = ?{}", values.len()));
        }
        if let Some(ref flavor) = data.flavor_profile {
            values.push(Box::new(flavor.trim().to_string()));
            updates.push(format!("flavor_profile = ?{}", values.len()));
        }
        if let Some(ref meal_types) = data.meal_types {
            validate_meal_types(meal_types)?;
            values.push(Box::new(encode_meal_types(meal_types)));
            updates.push(format!("meal_types = ?{}", values.len()));
        }
        if let Some(minutes) = data.prep_time_minutes {
            validate_minutes(Some(minutes), "prep_time_minutes")?;
            values.push(Box::new(minutes));
            updates.push(format!("prep_time_minutes = ?{}", values.len()));
        }
        if let Some(minutes) = data.cook_time_minutes {
            validate_minutes(Some(minutes), "cook_time_minutes")?;
            values.push(Box::new(minutes));
            updates.push(format!("cook_time_minutes = ?{}", values.len()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());
        values.push(Box::new(id));
        let sql = format!(
            "UPDATE recipes SET {} WHERE id = ?{}",
            updates.join(", "),
            values.len()
        );

        let refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
        conn.execute(&sql, refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Number of meal plan slots using this recipe
    pub fn times_planned(conn: &Connection, id: i64) -> DbResult<i64> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM meal_plan_recipes WHERE recipe_id = ?1",
            [id],
            |row| row.get(0),
        )?)
    }

    /// Sections, ingredient lines and meal plan slots cascade
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

/// Meal types are stored as a JSON array, so match the quoted name
fn meal_type_pattern(meal_type: Option<MealType>) -> Option<String> {
    meal_type.map(|m| format!("%\"{}\"%", m.as_str()))
}

fn encode_meal_types(meal_types: &[MealType]) -> String {
    let names: Vec<&str> = meal_types.iter().map(|m| m.as_str()).collect();
    serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
}

fn validate_servings(servings: i64) -> DbResult<()> {
    if servings < 1 {
        return Err(DbError::invalid("servings must be at least 1"));
    }
    Ok(())
}

fn validate_meal_types(meal_types: &[MealType]) -> DbResult<()> {
    if meal_types.is_empty() {
        return Err(DbError::invalid("At least one meal type is required"));
    }
    Ok(())
}

fn validate_minutes(minutes: Option<i64>, field: &str) -> DbResult<()> {
    match minutes {
        Some(m) if m < 0 => Err(DbError::invalid(format!("{} cannot be negative", field))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::test_connection;

    fn pancakes() -> RecipeCreate {
        RecipeCreate {
            name: "Pancakes".into(),
            instructions: "Mix and fry.".into(),
            servings: 4,
            flavor_profile: "sweet".into(),
            meal_types: vec![MealType::Breakfast],
            prep_time_minutes: Some(10),
            cook_time_minutes: Some(15),
        }
    }

    #[test]
    fn create_round_trips_meal_types() {
        let conn = test_connection();
        let recipe = Recipe::create(&conn, &pancakes()).unwrap();
        assert_eq!(recipe.servings, 4);
        assert_eq!(recipe.meal_types, vec![MealType::Breakfast]);
        let stored: String = conn
            .query_row("SELECT meal_types FROM recipes WHERE id = ?1", [recipe.id], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, r#"["Breakfast"]"#);
    }

    #[test]
    fn create_validates_input() {
        let conn = test_connection();
        let zero = RecipeCreate { servings: 0, ..pancakes() };
        assert!(matches!(Recipe::create(&conn, &zero), Err(DbError::Invalid(_))));
        let untyped = RecipeCreate { meal_types: vec![], ..pancakes() };
        assert!(matches!(Recipe::create(&conn, &untyped), Err(DbError::Invalid(_))));
        let negative = RecipeCreate { prep_time_minutes: Some(-5), ..pancakes() };
        assert!(matches!(Recipe::create(&conn, &negative), Err(DbError::Invalid(_))));
    }

    #[test]
    fn list_filters_by_meal_type() {
        let conn = test_connection();
        Recipe::create(&conn, &pancakes()).unwrap();
        let stew = RecipeCreate {
            name: "Stew".into(),
            meal_types: vec![MealType::Lunch, MealType::Dinner],
            ..pancakes()
        };
        Recipe::create(&conn, &stew).unwrap();

        let dinners = Recipe::list(&conn, None, Some(MealType::Dinner), 50, 0).unwrap();
        assert_eq!(dinners.len(), 1);
        assert_eq!(dinners[0].name, "Stew");
        assert_eq!(Recipe::list(&conn, Some("cake"), None, 50, 0).unwrap().len(), 1);
        assert_eq!(Recipe::count(&conn, None, Some(MealType::Dinner)).unwrap(), 1);
        assert_eq!(Recipe::count(&conn, Some("cake"), Some(MealType::Lunch)).unwrap(), 0);
        assert_eq!(Recipe::count(&conn, None, None).unwrap(), 2);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let conn = test_connection();
        Recipe::create(&conn, &pancakes()).unwrap();
        let discounted = RecipeCreate { name: "50% Whole Wheat Bread".into(), ..pancakes() };
        Recipe::create(&conn, &discounted).unwrap();

        let hits = Recipe::list(&conn, Some("50%"), None, 50, 0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "50% Whole Wheat Bread");
        assert_eq!(Recipe::list(&conn, Some("%"), None, 50, 0).unwrap().len(), 1);
        assert_eq!(Recipe::count(&conn, Some("_"), None).unwrap(), 0);
    }

    #[test]
    fn update_changes_only_given_fields() {
        let conn = test_connection();
        let recipe = Recipe::create(&conn, &pancakes()).unwrap();
        let updated = Recipe::update(
            &conn,
            recipe.id,
            &RecipeUpdate { servings: Some(6), ..Default::default() },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.servings, 6);
        assert_eq!(updated.name, "Pancakes");

        let bad = RecipeUpdate { servings: Some(0), ..Default::default() };
        assert!(Recipe::update(&conn, recipe.id, &bad).is_err());
    }
}
