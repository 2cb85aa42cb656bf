//! Meal Planner MCP Server Implementation
//!
//! Exposes the planner tools over MCP.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{
    DisplayMode, GroceryStoreSectionUpdate, IngredientCreate, IngredientLine, IngredientUpdate,
    MealPlanCreate, MealPlanRecipeCreate, MealPlanRecipeUpdate, MealPlanUpdate, MealType,
    RecipeCreate, RecipeUpdate, SectionInput, ShoppingListItemCreate, ShoppingListItemUpdate,
};
use crate::tools::status::StatusTracker;
use crate::tools::{grocery_stores, ingredients, meal_plans, quantities, recipes, shopping_lists};

/// Meal Planner MCP Service
#[derive(Clone)]
pub struct MealPlanService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<MealPlanService>,
}

impl MealPlanService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn found_or_error<T: Serialize>(value: Option<T>, what: &str, id: i64) -> Result<CallToolResult, McpError> {
    match value {
        Some(value) => json_result(&value),
        None => Ok(CallToolResult::success(vec![Content::text(format!(
            r#"{{"error": "{} not found", "id": {}}}"#,
            what, id
        ))])),
    }
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, McpError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| McpError::invalid_params(format!("{} must be a date in YYYY-MM-DD format", field), None))
}

fn parse_meal_type(value: &str) -> Result<MealType, McpError> {
    MealType::parse(value)
        .ok_or_else(|| McpError::invalid_params("meal_type must be Breakfast, Lunch or Dinner", None))
}

fn parse_display_mode(value: &str) -> Result<DisplayMode, McpError> {
    DisplayMode::parse(value)
        .ok_or_else(|| McpError::invalid_params("display_mode must be manual, alphabetical or store", None))
}

/// `Some(None)` when `clear` is set, so the stored value is removed
fn override_value(value: Option<i64>, clear: bool) -> Option<Option<i64>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn default_list_limit() -> i64 { 50 }

// ============================================================================
// Common Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PageParams {
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConvertQuantityParams {
    /// Quantity text such as "2", "0.5", "3/4" or "1 1/2"
    pub quantity: String,
}

// ============================================================================
// Ingredient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddIngredientParams {
    pub name: String,
    pub grocery_store_id: Option<i64>,
    pub grocery_store_section_id: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListIngredientsParams {
    pub query: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateIngredientParams {
    pub id: i64,
    pub name: Option<String>,
    pub grocery_store_id: Option<i64>,
    pub grocery_store_section_id: Option<i64>,
    /// Remove the default store
    #[serde(default)]
    pub clear_grocery_store: bool,
    /// Remove the default section
    #[serde(default)]
    pub clear_grocery_store_section: bool,
}

// ============================================================================
// Grocery Store Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateGroceryStoreParams {
    pub name: String,
    /// Section names in walking order
    #[serde(default)]
    pub sections: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RenameGroceryStoreParams {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddStoreSectionParams {
    pub grocery_store_id: i64,
    pub name: String,
    /// Position; appended after the last section when omitted
    pub sort_order: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateStoreSectionParams {
    pub id: i64,
    pub name: Option<String>,
    pub sort_order: Option<i64>,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngredientLineParams {
    /// Existing ingredient; takes precedence over ingredient_name
    pub ingredient_id: Option<i64>,
    /// Ingredient name, created if it does not exist
    pub ingredient_name: Option<String>,
    /// Number, fraction or mixed number: "2", "0.5", "3/4", "1 1/2"
    pub quantity: String,
    pub unit: String,
    pub note: Option<String>,
}

impl From<IngredientLineParams> for IngredientLine {
    fn from(p: IngredientLineParams) -> Self {
        Self {
            ingredient_id: p.ingredient_id,
            ingredient_name: p.ingredient_name,
            quantity: p.quantity,
            unit: p.unit,
            note: p.note,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SectionParams {
    pub name: String,
    pub instructions: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientLineParams>,
}

impl From<SectionParams> for SectionInput {
    fn from(p: SectionParams) -> Self {
        Self {
            name: p.name,
            instructions: p.instructions,
            ingredients: p.ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

fn convert_lines(
    ingredients: Option<Vec<IngredientLineParams>>,
    sections: Option<Vec<SectionParams>>,
) -> (Option<Vec<IngredientLine>>, Option<Vec<SectionInput>>) {
    (
        ingredients.map(|lines| lines.into_iter().map(Into::into).collect()),
        sections.map(|sections| sections.into_iter().map(Into::into).collect()),
    )
}

fn parse_meal_types(values: &[String]) -> Result<Vec<MealType>, McpError> {
    values.iter().map(|v| parse_meal_type(v)).collect()
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    /// Servings the listed quantities produce
    pub servings: i64,
    #[serde(default)]
    pub flavor_profile: String,
    /// Any of Breakfast, Lunch, Dinner
    pub meal_types: Vec<String>,
    pub prep_time_minutes: Option<i64>,
    pub cook_time_minutes: Option<i64>,
    /// Flat ingredient list (do not combine with sections)
    pub ingredients: Option<Vec<IngredientLineParams>>,
    /// Named sections with their own ingredients (do not combine with ingredients)
    pub sections: Option<Vec<SectionParams>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    pub query: Option<String>,
    /// Breakfast, Lunch or Dinner
    pub meal_type: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeParams {
    pub id: i64,
    pub name: Option<String>,
    pub instructions: Option<String>,
    pub servings: Option<i64>,
    pub flavor_profile: Option<String>,
    pub meal_types: Option<Vec<String>>,
    pub prep_time_minutes: Option<i64>,
    pub cook_time_minutes: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetRecipeIngredientsParams {
    pub id: i64,
    pub ingredients: Option<Vec<IngredientLineParams>>,
    pub sections: Option<Vec<SectionParams>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteRecipeParams {
    pub id: i64,
    /// Also remove the recipe from any meal plans
    #[serde(default)]
    pub force: bool,
}

// ============================================================================
// Meal Plan Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateMealPlanParams {
    /// Generated from the dates when omitted
    pub name: Option<String>,
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD, on or after start_date
    pub end_date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMealPlanParams {
    pub id: i64,
    /// Empty string regenerates the name from the dates
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMealPlanRecipeParams {
    pub meal_plan_id: i64,
    pub recipe_id: i64,
    /// YYYY-MM-DD within the meal plan
    pub date: String,
    /// Breakfast, Lunch or Dinner
    pub meal_type: String,
    /// Servings to cook
    pub servings: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMealPlanRecipeParams {
    pub id: i64,
    pub recipe_id: Option<i64>,
    pub date: Option<String>,
    pub meal_type: Option<String>,
    pub servings: Option<i64>,
}

// ============================================================================
// Shopping List Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealPlanIdParams {
    pub meal_plan_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateShoppingListParams {
    pub meal_plan_id: i64,
    /// manual (default), alphabetical or store
    pub display_mode: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetDisplayModeParams {
    pub id: i64,
    /// manual, alphabetical or store
    pub display_mode: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddShoppingListItemParams {
    pub shopping_list_id: i64,
    pub ingredient_id: Option<i64>,
    pub ingredient_name: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub grocery_store_id: Option<i64>,
    pub grocery_store_section_id: Option<i64>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateShoppingListItemParams {
    pub id: i64,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub is_purchased: Option<bool>,
    pub sort_order: Option<i64>,
    /// Store override for this item only
    pub grocery_store_id: Option<i64>,
    /// Section override for this item only
    pub grocery_store_section_id: Option<i64>,
    #[serde(default)]
    pub clear_sort_order: bool,
    /// Fall back to the ingredient's default store
    #[serde(default)]
    pub clear_grocery_store: bool,
    /// Fall back to the ingredient's default section
    #[serde(default)]
    pub clear_grocery_store_section: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ItemPositionParams {
    pub id: i64,
    pub sort_order: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReorderShoppingListItemsParams {
    pub shopping_list_id: i64,
    pub items: Vec<ItemPositionParams>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl MealPlanService {
    // --- Status ---

    #[tool(description = "Get the current status of the meal planner service including build info, database status, and process information")]
    async fn mealplan_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get step-by-step instructions for planning meals and building shopping lists. Call this when starting a planning session or when unsure how to use the tools.")]
    fn planner_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::PLANNER_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(PLANNER_INSTRUCTIONS)]))
    }

    #[tool(description = "Check a quantity string and convert it: returns whether it is valid, its decimal value and its display fraction")]
    fn convert_quantity(&self, Parameters(p): Parameters<ConvertQuantityParams>) -> Result<CallToolResult, McpError> {
        json_result(&quantities::convert_quantity(&p.quantity))
    }

    // --- Ingredients ---

    #[tool(description = "Create an ingredient, optionally with a default grocery store and section")]
    fn add_ingredient(&self, Parameters(p): Parameters<AddIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientCreate {
            name: p.name,
            grocery_store_id: p.grocery_store_id,
            grocery_store_section_id: p.grocery_store_section_id,
        };
        let result = ingredients::add_ingredient(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get an ingredient with its default store/section names and how often it is used")]
    fn get_ingredient(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::get_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Ingredient", p.id)
    }

    #[tool(description = "List ingredients by name with optional search and pagination")]
    fn list_ingredients(&self, Parameters(p): Parameters<ListIngredientsParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::list_ingredients(&self.database, p.query.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Rename an ingredient or change/clear its default grocery store and section")]
    fn update_ingredient(&self, Parameters(p): Parameters<UpdateIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientUpdate {
            name: p.name,
            grocery_store_id: override_value(p.grocery_store_id, p.clear_grocery_store),
            grocery_store_section_id: override_value(p.grocery_store_section_id, p.clear_grocery_store_section),
        };
        let result = ingredients::update_ingredient(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Ingredient", p.id)
    }

    #[tool(description = "Delete an ingredient (only allowed if no recipe or shopping list uses it)")]
    fn delete_ingredient(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::delete_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Ok(success) => json_result(&success),
            Err(blocked) => json_result(&blocked),
        }
    }

    // --- Grocery Stores ---

    #[tool(description = "Create a grocery store with its aisle sections in walking order")]
    fn create_grocery_store(&self, Parameters(p): Parameters<CreateGroceryStoreParams>) -> Result<CallToolResult, McpError> {
        let result = grocery_stores::create_grocery_store(&self.database, &p.name, p.sections)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a grocery store with its sections")]
    fn get_grocery_store(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = grocery_stores::get_grocery_store(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Grocery store", p.id)
    }

    #[tool(description = "List all grocery stores with their sections")]
    fn list_grocery_stores(&self) -> Result<CallToolResult, McpError> {
        let result = grocery_stores::list_grocery_stores(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Rename a grocery store")]
    fn rename_grocery_store(&self, Parameters(p): Parameters<RenameGroceryStoreParams>) -> Result<CallToolResult, McpError> {
        let result = grocery_stores::rename_grocery_store(&self.database, p.id, &p.name)
            .map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Grocery store", p.id)
    }

    #[tool(description = "Delete a grocery store and its sections. Ingredients and list items that pointed at it become unsorted.")]
    fn delete_grocery_store(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = grocery_stores::delete_grocery_store(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Grocery store", p.id)
    }

    #[tool(description = "Add an aisle section to a grocery store")]
    fn add_store_section(&self, Parameters(p): Parameters<AddStoreSectionParams>) -> Result<CallToolResult, McpError> {
        let result = grocery_stores::add_store_section(&self.database, p.grocery_store_id, &p.name, p.sort_order)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Rename or move a grocery store section")]
    fn update_store_section(&self, Parameters(p): Parameters<UpdateStoreSectionParams>) -> Result<CallToolResult, McpError> {
        let data = GroceryStoreSectionUpdate { name: p.name, sort_order: p.sort_order };
        let result = grocery_stores::update_store_section(&self.database, p.id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Grocery store section", p.id)
    }

    #[tool(description = "Delete a grocery store section")]
    fn delete_store_section(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = grocery_stores::delete_store_section(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Grocery store section", p.id)
    }

    // --- Recipes ---

    #[tool(description = "Create a recipe with its ingredients. Provide either a flat ingredients list or named sections, not both. Unknown ingredient names are created.")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeCreate {
            name: p.name,
            instructions: p.instructions,
            servings: p.servings,
            flavor_profile: p.flavor_profile,
            meal_types: parse_meal_types(&p.meal_types)?,
            prep_time_minutes: p.prep_time_minutes,
            cook_time_minutes: p.cook_time_minutes,
        };
        let (lines, sections) = convert_lines(p.ingredients, p.sections);
        let result = recipes::create_recipe(&self.database, data, lines, sections)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get full recipe details with ingredients and sections")]
    fn get_recipe(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Recipe", p.id)
    }

    #[tool(description = "List recipes with optional name search, meal type filter, and pagination")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let meal_type = p.meal_type.as_deref().map(parse_meal_type).transpose()?;
        let result = recipes::list_recipes(&self.database, p.query.as_deref(), meal_type, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update recipe metadata (name, instructions, servings, flavor profile, meal types, times)")]
    fn update_recipe(&self, Parameters(p): Parameters<UpdateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeUpdate {
            name: p.name,
            instructions: p.instructions,
            servings: p.servings,
            flavor_profile: p.flavor_profile,
            meal_types: p.meal_types.as_deref().map(parse_meal_types).transpose()?,
            prep_time_minutes: p.prep_time_minutes,
            cook_time_minutes: p.cook_time_minutes,
        };
        let result = recipes::update_recipe(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Recipe", p.id)
    }

    #[tool(description = "Replace all ingredients of a recipe. Provide either a flat ingredients list or named sections, not both.")]
    fn set_recipe_ingredients(&self, Parameters(p): Parameters<SetRecipeIngredientsParams>) -> Result<CallToolResult, McpError> {
        let (lines, sections) = convert_lines(p.ingredients, p.sections);
        let result = recipes::set_recipe_ingredients(&self.database, p.id, lines, sections)
            .map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Recipe", p.id)
    }

    #[tool(description = "Delete a recipe. Requires force=true while it is assigned in a meal plan.")]
    fn delete_recipe(&self, Parameters(p): Parameters<DeleteRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe(&self.database, p.id, p.force).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Ok(success) => json_result(&success),
            Err(blocked) => json_result(&blocked),
        }
    }

    // --- Meal Plans ---

    #[tool(description = "Create a meal plan for a date range. The name is generated from the dates when omitted.")]
    fn create_meal_plan(&self, Parameters(p): Parameters<CreateMealPlanParams>) -> Result<CallToolResult, McpError> {
        let data = MealPlanCreate {
            name: p.name,
            start_date: parse_date(&p.start_date, "start_date")?,
            end_date: parse_date(&p.end_date, "end_date")?,
        };
        let result = meal_plans::create_meal_plan(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a meal plan with its assigned recipes in calendar order")]
    fn get_meal_plan(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = meal_plans::get_meal_plan(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Meal plan", p.id)
    }

    #[tool(description = "List meal plans, most recent first")]
    fn list_meal_plans(&self, Parameters(p): Parameters<PageParams>) -> Result<CallToolResult, McpError> {
        let result = meal_plans::list_meal_plans(&self.database, p.limit, p.offset).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Rename a meal plan or change its dates (assigned recipes must stay inside the range)")]
    fn update_meal_plan(&self, Parameters(p): Parameters<UpdateMealPlanParams>) -> Result<CallToolResult, McpError> {
        let data = MealPlanUpdate {
            name: p.name,
            start_date: p.start_date.as_deref().map(|d| parse_date(d, "start_date")).transpose()?,
            end_date: p.end_date.as_deref().map(|d| parse_date(d, "end_date")).transpose()?,
        };
        let result = meal_plans::update_meal_plan(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Meal plan", p.id)
    }

    #[tool(description = "Delete a meal plan together with its assignments and shopping list")]
    fn delete_meal_plan(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = meal_plans::delete_meal_plan(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Meal plan", p.id)
    }

    #[tool(description = "Assign a recipe to a date and meal type (Breakfast, Lunch, Dinner) in a meal plan with the servings to cook")]
    fn add_meal_plan_recipe(&self, Parameters(p): Parameters<AddMealPlanRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = MealPlanRecipeCreate {
            recipe_id: p.recipe_id,
            date: parse_date(&p.date, "date")?,
            meal_type: parse_meal_type(&p.meal_type)?,
            servings: p.servings,
        };
        let result = meal_plans::add_meal_plan_recipe(&self.database, p.meal_plan_id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Change the recipe, date, meal type or servings of a meal plan assignment")]
    fn update_meal_plan_recipe(&self, Parameters(p): Parameters<UpdateMealPlanRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = MealPlanRecipeUpdate {
            recipe_id: p.recipe_id,
            date: p.date.as_deref().map(|d| parse_date(d, "date")).transpose()?,
            meal_type: p.meal_type.as_deref().map(parse_meal_type).transpose()?,
            servings: p.servings,
        };
        let result = meal_plans::update_meal_plan_recipe(&self.database, p.id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Meal plan recipe", p.id)
    }

    #[tool(description = "Remove a recipe assignment from a meal plan")]
    fn remove_meal_plan_recipe(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = meal_plans::remove_meal_plan_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Meal plan recipe", p.id)
    }

    // --- Shopping Lists ---

    #[tool(description = "Show the shopping list a meal plan would produce, without saving it")]
    fn preview_shopping_list(&self, Parameters(p): Parameters<MealPlanIdParams>) -> Result<CallToolResult, McpError> {
        let result = shopping_lists::preview_shopping_list(&self.database, p.meal_plan_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Meal plan", p.meal_plan_id)
    }

    #[tool(description = "Create the shopping list for a meal plan, filled with scaled and combined ingredients. One list per meal plan.")]
    fn create_shopping_list(&self, Parameters(p): Parameters<CreateShoppingListParams>) -> Result<CallToolResult, McpError> {
        let mode = p.display_mode.as_deref().map(parse_display_mode).transpose()?.unwrap_or_default();
        let result = shopping_lists::create_shopping_list(&self.database, p.meal_plan_id, mode)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a shopping list with items in its display order")]
    fn get_shopping_list(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = shopping_lists::get_shopping_list(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Shopping list", p.id)
    }

    #[tool(description = "Get the shopping list of a meal plan")]
    fn get_shopping_list_for_plan(&self, Parameters(p): Parameters<MealPlanIdParams>) -> Result<CallToolResult, McpError> {
        let result = shopping_lists::get_shopping_list_for_plan(&self.database, p.meal_plan_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Shopping list for meal plan", p.meal_plan_id)
    }

    #[tool(description = "List shopping lists, most recent first")]
    fn list_shopping_lists(&self, Parameters(p): Parameters<PageParams>) -> Result<CallToolResult, McpError> {
        let result = shopping_lists::list_shopping_lists(&self.database, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Set how a shopping list is ordered: manual, alphabetical or store (grouped by store and section)")]
    fn set_shopping_list_display_mode(&self, Parameters(p): Parameters<SetDisplayModeParams>) -> Result<CallToolResult, McpError> {
        let mode = parse_display_mode(&p.display_mode)?;
        let result = shopping_lists::set_display_mode(&self.database, p.id, mode).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Shopping list", p.id)
    }

    #[tool(description = "Rebuild a shopping list from its meal plan. Manual edits, added items and purchased marks are lost.")]
    fn regenerate_shopping_list(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = shopping_lists::regenerate_shopping_list(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Shopping list", p.id)
    }

    #[tool(description = "Delete a shopping list and its items")]
    fn delete_shopping_list(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = shopping_lists::delete_shopping_list(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Shopping list", p.id)
    }

    #[tool(description = "Add an item to a shopping list by ingredient id or name")]
    fn add_shopping_list_item(&self, Parameters(p): Parameters<AddShoppingListItemParams>) -> Result<CallToolResult, McpError> {
        let data = ShoppingListItemCreate {
            ingredient_id: p.ingredient_id,
            ingredient_name: p.ingredient_name,
            quantity: p.quantity,
            unit: p.unit,
            grocery_store_id: p.grocery_store_id,
            grocery_store_section_id: p.grocery_store_section_id,
            sort_order: p.sort_order,
        };
        let result = shopping_lists::add_shopping_list_item(&self.database, p.shopping_list_id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a shopping list item: mark purchased, change quantity/unit/position, or set or clear its store and section")]
    fn update_shopping_list_item(&self, Parameters(p): Parameters<UpdateShoppingListItemParams>) -> Result<CallToolResult, McpError> {
        let data = ShoppingListItemUpdate {
            quantity: p.quantity,
            unit: p.unit,
            is_purchased: p.is_purchased,
            sort_order: override_value(p.sort_order, p.clear_sort_order),
            grocery_store_id: override_value(p.grocery_store_id, p.clear_grocery_store),
            grocery_store_section_id: override_value(p.grocery_store_section_id, p.clear_grocery_store_section),
        };
        let result = shopping_lists::update_shopping_list_item(&self.database, p.id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Shopping list item", p.id)
    }

    #[tool(description = "Delete a shopping list item")]
    fn delete_shopping_list_item(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = shopping_lists::delete_shopping_list_item(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        found_or_error(result, "Shopping list item", p.id)
    }

    #[tool(description = "Set manual positions for shopping list items. Fails without changes if any item is not on the list.")]
    fn reorder_shopping_list_items(&self, Parameters(p): Parameters<ReorderShoppingListItemsParams>) -> Result<CallToolResult, McpError> {
        let positions = p.items.into_iter().map(|i| (i.id, i.sort_order)).collect();
        let result = shopping_lists::reorder_shopping_list_items(&self.database, p.shopping_list_id, positions)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for MealPlanService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mealplan".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Meal Planner".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Meal Planner - recipes, meal plans and shopping lists. \
                 IMPORTANT: Call planner_instructions before planning. \
                 Ingredients: add/get/list/update/delete_ingredient. \
                 Stores: create/get/list/rename/delete_grocery_store, add/update/delete_store_section. \
                 Recipes: create/get/list/update/delete_recipe, set_recipe_ingredients. \
                 Meal plans: create/get/list/update/delete_meal_plan, add/update/remove_meal_plan_recipe. \
                 Shopping: preview_shopping_list, create/get/list/delete_shopping_list, get_shopping_list_for_plan, \
                 regenerate_shopping_list, set_shopping_list_display_mode, \
                 add/update/delete_shopping_list_item, reorder_shopping_list_items. \
                 Quantities: convert_quantity."
                    .into(),
            ),
        }
    }
}
