//! Meal Planner Status Tool
//!
//! Runtime status of the service plus the usage guide for assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Planning instructions for AI assistants
pub const PLANNER_INSTRUCTIONS: &str = r#"
# Meal Planner Instructions

This guide explains how to go from recipes to a shopping list.

## Overview

1. **Ingredients** - Named items, optionally with a default grocery store and aisle section
2. **Recipes** - A base serving count plus ingredient lines (quantity + unit)
3. **Meal Plans** - A date range; recipes are assigned to (date, meal type) slots
4. **Shopping Lists** - One per meal plan, generated from the assigned recipes

---

## Quantities

Quantities are entered as text and may be:
- Whole or decimal numbers: `2`, `0.5`, `1.25`
- Fractions: `1/2`, `3/4`
- Mixed numbers: `1 1/2`, `2 1/4`

Use `convert_quantity` to check a value before saving it. Stored quantities
are shown back as common fractions (halves, thirds, quarters, eighths)
when they are close enough, otherwise as decimals.

---

## Recipes

`create_recipe` takes **either** `ingredients` (a flat list) **or**
`sections` (named groups such as "Crust" and "Filling"), never both.
Each line names its ingredient; unknown ingredients are created on the fly.
The same ingredient may appear several times, e.g. butter in both the crust
and the filling.

`servings` is the number of servings the quantities produce. It is used to
scale the recipe when planning.

`set_recipe_ingredients` replaces every line and section of a recipe.

---

## Meal Plans

1. `create_meal_plan` with `start_date` and `end_date` (YYYY-MM-DD). Leave
   the name out to get one like "January 20 - 26, 2026".
2. `add_meal_plan_recipe` for each meal: date inside the plan, meal type
   (`Breakfast`, `Lunch` or `Dinner`) and the servings you want to cook.
   Each slot holds one recipe.

---

## Shopping Lists

- `preview_shopping_list` shows what the plan needs without saving anything.
- `create_shopping_list` builds the list for a meal plan. Every recipe is
  scaled by `planned servings / recipe servings` and quantities are added up
  per ingredient **and unit**. Units are never converted: 1 cup of butter
  and 2 tbsp of butter stay separate lines.
- Items are ordered by ingredient name when generated.
- `set_shopping_list_display_mode`:
  - `manual` - your own order (`reorder_shopping_list_items`)
  - `alphabetical` - by ingredient name
  - `store` - grouped by store and aisle section, unsorted items first
  - purchased items move to the bottom in every mode
- `update_shopping_list_item` marks items purchased, changes quantities or
  overrides the store/section for one list only.
- `regenerate_shopping_list` rebuilds the list from the current plan.
  **Manual edits, added items and purchased marks are lost.**

---

## Tips

- Set a default store and section on ingredients you always buy in the
  same place; store mode uses them automatically.
- Recipes with no usable serving count are left out of generated lists.
"#;

/// Runtime status of the meal planner service
#[derive(Debug, Clone, Serialize)]
pub struct MealPlannerStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    pub fn get_status(&self) -> MealPlannerStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));
        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        MealPlannerStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_database_has_no_size() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/mealplan.db"));
        let status = tracker.get_status();
        assert!(status.database_size_bytes.is_none());
        assert_eq!(status.process_id, std::process::id());
    }

    #[test]
    fn existing_database_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.db");
        std::fs::write(&path, b"0123456789").unwrap();
        let status = StatusTracker::new(path).get_status();
        assert_eq!(status.database_size_bytes, Some(10));
    }
}
