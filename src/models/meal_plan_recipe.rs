//! Recipe assignments within a meal plan
//!
//! Each row puts one recipe on a (date, meal type) slot with the number of
//! servings to cook.

use std::fmt;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::{date_column, MealPlan, Recipe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
        }
    }

    /// Case-insensitive
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanRecipe {
    pub id: i64,
    pub meal_plan_id: i64,
    pub recipe_id: i64,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub servings: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Assignment joined with its recipe's name and base servings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanRecipeDetail {
    pub id: i64,
    pub recipe_id: i64,
    pub recipe_name: String,
    pub recipe_servings: i64,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub servings: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanRecipeCreate {
    pub recipe_id: i64,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub servings: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealPlanRecipeUpdate {
    pub recipe_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub meal_type: Option<MealType>,
    pub servings: Option<i64>,
}

fn meal_type_column(row: &Row, column: &str) -> rusqlite::Result<MealType> {
    let raw: String = row.get(column)?;
    MealType::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown meal type '{}'", raw).into(),
        )
    })
}

impl MealPlanRecipe {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            meal_plan_id: row.get("meal_plan_id")?,
            recipe_id: row.get("recipe_id")?,
            date: date_column(row, "date")?,
            meal_type: meal_type_column(row, "meal_type")?,
            servings: row.get("servings")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, meal_plan_id: i64, data: &MealPlanRecipeCreate) -> DbResult<Self> {
        let plan = MealPlan::get_by_id(conn, meal_plan_id)?
            .ok_or_else(|| DbError::invalid(format!("Meal plan {} not found", meal_plan_id)))?;
        validate_assignment(conn, &plan, data.recipe_id, data.date, data.servings)?;
        ensure_slot_free(conn, meal_plan_id, data.date, data.meal_type, None)?;

        conn.execute(
            r#"
            INSERT INTO meal_plan_recipes (meal_plan_id, recipe_id, date, meal_type, servings)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![meal_plan_id, data.recipe_id, data.date.to_string(), data.meal_type.as_str(), data.servings],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        Ok(conn
            .query_row("SELECT * FROM meal_plan_recipes WHERE id = ?1", [id], Self::from_row)
            .optional()?)
    }

    /// Assignments in calendar order: date, then Breakfast/Lunch/Dinner
    pub fn list_for_plan(conn: &Connection, meal_plan_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM meal_plan_recipes WHERE meal_plan_id = ?1 ORDER BY date, {}, id",
            MEAL_TYPE_ORDER
        ))?;
        let rows = stmt
            .query_map([meal_plan_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn details_for_plan(conn: &Connection, meal_plan_id: i64) -> DbResult<Vec<MealPlanRecipeDetail>> {
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT mpr.id, mpr.recipe_id, r.name AS recipe_name, r.servings AS recipe_servings,
                   mpr.date, mpr.meal_type, mpr.servings
            FROM meal_plan_recipes mpr
            INNER JOIN recipes r ON r.id = mpr.recipe_id
            WHERE mpr.meal_plan_id = ?1
            ORDER BY mpr.date, {}, mpr.id
            "#,
            MEAL_TYPE_ORDER
        ))?;
        let rows = stmt
            .query_map([meal_plan_id], |row| {
                Ok(MealPlanRecipeDetail {
                    id: row.get("id")?,
                    recipe_id: row.get("recipe_id")?,
                    recipe_name: row.get("recipe_name")?,
                    recipe_servings: row.get("recipe_servings")?,
                    date: date_column(row, "date")?,
                    meal_type: meal_type_column(row, "meal_type")?,
                    servings: row.get("servings")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn update(conn: &Connection, id: i64, data: &MealPlanRecipeUpdate) -> DbResult<Option<Self>> {
        let Some(existing) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };
        let plan = MealPlan::get_by_id(conn, existing.meal_plan_id)?
            .ok_or_else(|| DbError::invalid(format!("Meal plan {} not found", existing.meal_plan_id)))?;

        let recipe_id = data.recipe_id.unwrap_or(existing.recipe_id);
        let date = data.date.unwrap_or(existing.date);
        let meal_type = data.meal_type.unwrap_or(existing.meal_type);
        let servings = data.servings.unwrap_or(existing.servings);

        validate_assignment(conn, &plan, recipe_id, date, servings)?;
        ensure_slot_free(conn, plan.id, date, meal_type, Some(id))?;

        conn.execute(
            r#"
            UPDATE meal_plan_recipes
            SET recipe_id = ?1, date = ?2, meal_type = ?3, servings = ?4, updated_at = datetime('now')
            WHERE id = ?5
            "#,
            params![recipe_id, date.to_string(), meal_type.as_str(), servings, id],
        )?;

        Self::get_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM meal_plan_recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

const MEAL_TYPE_ORDER: &str =
    "CASE meal_type WHEN 'Breakfast' THEN 0 WHEN 'Lunch' THEN 1 WHEN 'Dinner' THEN 2 ELSE 3 END";

fn validate_assignment(
    conn: &Connection,
    plan: &MealPlan,
    recipe_id: i64,
    date: NaiveDate,
    servings: i64,
) -> DbResult<()> {
    if servings < 1 {
        return Err(DbError::invalid("servings must be at least 1"));
    }
    if !plan.contains(date) {
        return Err(DbError::invalid(format!(
            "Date {} is outside the meal plan ({} to {})",
            date, plan.start_date, plan.end_date
        )));
    }
    if Recipe::get_by_id(conn, recipe_id)?.is_none() {
        return Err(DbError::invalid(format!("Recipe {} not found", recipe_id)));
    }
    Ok(())
}

fn ensure_slot_free(
    conn: &Connection,
    meal_plan_id: i64,
    date: NaiveDate,
    meal_type: MealType,
    except_id: Option<i64>,
) -> DbResult<()> {
    let taken: i64 = conn.query_row(
        r#"
        SELECT COUNT(*) FROM meal_plan_recipes
        WHERE meal_plan_id = ?1 AND date = ?2 AND meal_type = ?3 AND id != COALESCE(?4, -1)
        "#,
        params![meal_plan_id, date.to_string(), meal_type.as_str(), except_id],
        |row| row.get(0),
    )?;
    if taken > 0 {
        return Err(DbError::invalid(format!("{} on {} already has a recipe", meal_type, date)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::test_connection;
    use crate::models::fixtures::{plan, recipe};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn meal_type_parses_and_serializes_capitalized() {
        assert_eq!(MealType::parse("dinner"), Some(MealType::Dinner));
        assert_eq!(MealType::parse("Brunch"), None);
        assert_eq!(serde_json::to_string(&MealType::Lunch).unwrap(), "\"Lunch\"");
    }

    #[test]
    fn assignments_list_in_calendar_order() {
        let conn = test_connection();
        let plan_id = plan(&conn, date(20), date(26));
        let stew = recipe(&conn, "Stew", 4);
        let oats = recipe(&conn, "Oats", 1);

        for (recipe_id, day, meal_type) in [(stew, 21, MealType::Dinner), (oats, 21, MealType::Breakfast), (stew, 20, MealType::Lunch)] {
            let data = MealPlanRecipeCreate { recipe_id, date: date(day), meal_type, servings: 2 };
            MealPlanRecipe::create(&conn, plan_id, &data).unwrap();
        }

        let details = MealPlanRecipe::details_for_plan(&conn, plan_id).unwrap();
        let slots: Vec<_> = details.iter().map(|d| (d.date, d.meal_type)).collect();
        assert_eq!(
            slots,
            vec![(date(20), MealType::Lunch), (date(21), MealType::Breakfast), (date(21), MealType::Dinner)]
        );
        assert_eq!(details[0].recipe_name, "Stew");
        assert_eq!(details[0].recipe_servings, 4);
    }

    #[test]
    fn create_enforces_range_servings_and_free_slot() {
        let conn = test_connection();
        let plan_id = plan(&conn, date(20), date(26));
        let stew = recipe(&conn, "Stew", 4);

        let outside = MealPlanRecipeCreate { recipe_id: stew, date: date(27), meal_type: MealType::Dinner, servings: 2 };
        assert!(matches!(MealPlanRecipe::create(&conn, plan_id, &outside), Err(DbError::Invalid(_))));

        let zero = MealPlanRecipeCreate { date: date(22), servings: 0, ..outside.clone() };
        assert!(matches!(MealPlanRecipe::create(&conn, plan_id, &zero), Err(DbError::Invalid(_))));

        let ok = MealPlanRecipeCreate { date: date(22), ..outside.clone() };
        MealPlanRecipe::create(&conn, plan_id, &ok).unwrap();
        assert!(matches!(MealPlanRecipe::create(&conn, plan_id, &ok), Err(DbError::Invalid(_))));

        let missing_recipe = MealPlanRecipeCreate { recipe_id: 999, date: date(23), ..outside };
        assert!(matches!(MealPlanRecipe::create(&conn, plan_id, &missing_recipe), Err(DbError::Invalid(_))));
    }

    #[test]
    fn update_revalidates_date_and_keeps_own_slot() {
        let conn = test_connection();
        let plan_id = plan(&conn, date(20), date(26));
        let stew = recipe(&conn, "Stew", 4);
        let data = MealPlanRecipeCreate { recipe_id: stew, date: date(22), meal_type: MealType::Dinner, servings: 2 };
        let assignment = MealPlanRecipe::create(&conn, plan_id, &data).unwrap();

        let more = MealPlanRecipeUpdate { servings: Some(6), ..Default::default() };
        let updated = MealPlanRecipe::update(&conn, assignment.id, &more).unwrap().unwrap();
        assert_eq!(updated.servings, 6);

        let moved = MealPlanRecipeUpdate { date: Some(date(19)), ..Default::default() };
        assert!(matches!(MealPlanRecipe::update(&conn, assignment.id, &moved), Err(DbError::Invalid(_))));
        assert!(MealPlanRecipe::update(&conn, 999, &more).unwrap().is_none());
    }
}
