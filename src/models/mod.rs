//! Data models and their persistence

pub mod grocery_store;
pub mod ingredient;
pub mod meal_plan;
pub mod meal_plan_recipe;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_section;
pub mod shopping_list;
pub mod shopping_list_item;

#[cfg(test)]
pub(crate) mod fixtures;

pub use grocery_store::{GroceryStore, GroceryStoreSection, GroceryStoreSectionUpdate};
pub use ingredient::{Ingredient, IngredientCreate, IngredientUpdate};
pub use meal_plan::{generate_name, MealPlan, MealPlanCreate, MealPlanUpdate};
pub use meal_plan_recipe::{
    MealPlanRecipe, MealPlanRecipeCreate, MealPlanRecipeDetail, MealPlanRecipeUpdate, MealType,
};
pub use recipe::{Recipe, RecipeCreate, RecipeUpdate};
pub use recipe_ingredient::{
    replace_recipe_ingredients, IngredientLine, RecipeIngredient, RecipeIngredientDetail, SectionInput,
};
pub use recipe_section::RecipeSection;
pub use shopping_list::{DisplayMode, ShoppingList};
pub use shopping_list_item::{
    ShoppingListItem, ShoppingListItemCreate, ShoppingListItemDetail, ShoppingListItemUpdate,
};

use chrono::NaiveDate;
use rusqlite::Row;

/// Read a `YYYY-MM-DD` text column
pub(crate) fn date_column(row: &Row, column: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(column)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

/// `LIKE` pattern matching `query` as a literal substring; pair with `ESCAPE '\'`
pub(crate) fn contains_pattern(query: Option<&str>) -> String {
    let mut pattern = String::from("%");
    for c in query.unwrap_or("").trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(None), "%%");
        assert_eq!(contains_pattern(Some(" egg ")), "%egg%");
        assert_eq!(contains_pattern(Some("50%_off\\")), "%50\\%\\_off\\\\%");
    }
}
