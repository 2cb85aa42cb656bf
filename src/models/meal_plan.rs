//! Meal plan model
//!
//! A named date range. Recipes are assigned to (date, meal type) slots
//! through `meal_plan_recipes`.

use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::date_column;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanCreate {
    /// Generated from the date range when missing or blank
    pub name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealPlanUpdate {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl MealPlan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            start_date: date_column(row, "start_date")?,
            end_date: date_column(row, "end_date")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &MealPlanCreate) -> DbResult<Self> {
        validate_range(data.start_date, data.end_date)?;
        let name = match data.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => generate_name(data.start_date, data.end_date),
        };

        conn.execute(
            "INSERT INTO meal_plans (name, start_date, end_date) VALUES (?1, ?2, ?3)",
            params![name, data.start_date.to_string(), data.end_date.to_string()],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        Ok(conn
            .query_row("SELECT * FROM meal_plans WHERE id = ?1", [id], Self::from_row)
            .optional()?)
    }

    /// Most recent plans first
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM meal_plans ORDER BY start_date DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let plans = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    /// Changing the range is refused while assignments would fall outside it
    pub fn update(conn: &Connection, id: i64, data: &MealPlanUpdate) -> DbResult<Option<Self>> {
        let Some(existing) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let start = data.start_date.unwrap_or(existing.start_date);
        let end = data.end_date.unwrap_or(existing.end_date);
        validate_range(start, end)?;

        let outside: i64 = conn.query_row(
            "SELECT COUNT(*) FROM meal_plan_recipes WHERE meal_plan_id = ?1 AND (date < ?2 OR date > ?3)",
            params![id, start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;
        if outside > 0 {
            return Err(DbError::invalid(format!(
                "{} assigned recipe(s) fall outside {} - {}",
                outside, start, end
            )));
        }

        let name = match data.name.as_deref().map(str::trim) {
            Some("") => generate_name(start, end),
            Some(name) => name.to_string(),
            None => existing.name,
        };

        conn.execute(
            r#"
            UPDATE meal_plans SET name = ?1, start_date = ?2, end_date = ?3, updated_at = datetime('now')
            WHERE id = ?4
            "#,
            params![name, start.to_string(), end.to_string(), id],
        )?;

        Self::get_by_id(conn, id)
    }

    /// Assignments and the shopping list cascade
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM meal_plans WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> DbResult<()> {
    if end < start {
        return Err(DbError::invalid("end_date must be on or after start_date"));
    }
    Ok(())
}

/// Human-readable name for a date range, collapsing the shared month/year
pub fn generate_name(start: NaiveDate, end: NaiveDate) -> String {
    if start == end {
        start.format("%B %-d, %Y").to_string()
    } else if start.year() == end.year() && start.month() == end.month() {
        format!("{} - {}", start.format("%B %-d"), end.format("%-d, %Y"))
    } else if start.year() == end.year() {
        format!("{} - {}", start.format("%B %-d"), end.format("%B %-d, %Y"))
    } else {
        format!("{} - {}", start.format("%B %-d, %Y"), end.format("%B %-d, %Y"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::test_connection;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn generated_names_collapse_shared_parts() {
        assert_eq!(generate_name(date(2026, 3, 15), date(2026, 3, 15)), "March 15, 2026");
        assert_eq!(generate_name(date(2026, 1, 20), date(2026, 1, 26)), "January 20 - 26, 2026");
        assert_eq!(
            generate_name(date(2026, 1, 28), date(2026, 2, 3)),
            "January 28 - February 3, 2026"
        );
        assert_eq!(
            generate_name(date(2025, 12, 29), date(2026, 1, 4)),
            "December 29, 2025 - January 4, 2026"
        );
    }

    #[test]
    fn create_names_blank_plans_and_checks_range() {
        let conn = test_connection();
        let plan = MealPlan::create(
            &conn,
            &MealPlanCreate { name: Some("  ".into()), start_date: date(2026, 1, 20), end_date: date(2026, 1, 26) },
        )
        .unwrap();
        assert_eq!(plan.name, "January 20 - 26, 2026");
        assert!(plan.contains(date(2026, 1, 26)));
        assert!(!plan.contains(date(2026, 1, 27)));

        let backwards = MealPlanCreate { name: None, start_date: date(2026, 1, 26), end_date: date(2026, 1, 20) };
        assert!(matches!(MealPlan::create(&conn, &backwards), Err(DbError::Invalid(_))));
    }

    #[test]
    fn update_refuses_to_strand_assignments() {
        let conn = test_connection();
        let plan = MealPlan::create(
            &conn,
            &MealPlanCreate { name: Some("Week".into()), start_date: date(2026, 1, 20), end_date: date(2026, 1, 26) },
        )
        .unwrap();
        conn.execute(
            "INSERT INTO recipes (name, servings, meal_types) VALUES ('Stew', 4, '[\"Dinner\"]')",
            [],
        )
        .unwrap();
        let recipe_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO meal_plan_recipes (meal_plan_id, recipe_id, date, meal_type, servings) VALUES (?1, ?2, '2026-01-25', 'Dinner', 2)",
            params![plan.id, recipe_id],
        )
        .unwrap();

        let shrink = MealPlanUpdate { end_date: Some(date(2026, 1, 22)), ..Default::default() };
        assert!(matches!(MealPlan::update(&conn, plan.id, &shrink), Err(DbError::Invalid(_))));

        let rename = MealPlanUpdate { name: Some("Late January".into()), ..Default::default() };
        let updated = MealPlan::update(&conn, plan.id, &rename).unwrap().unwrap();
        assert_eq!(updated.name, "Late January");
        assert_eq!(updated.end_date, date(2026, 1, 26));

        assert!(MealPlan::update(&conn, 999, &rename).unwrap().is_none());
    }
}
