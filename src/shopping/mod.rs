//! Shopping list generation
//!
//! Turns a meal plan's recipe assignments into scaled, deduplicated line
//! items, and orders stored items for display.

pub mod aggregator;
pub mod display;
pub mod snapshot;

pub use aggregator::{
    generate, Assignment, IngredientUsage, LineItem, PlannedRecipe, RecipeBook,
};
pub use display::{group_by_store, order_items, ItemGroup, ItemPlacement, Placed};
pub use snapshot::PlanSnapshot;
