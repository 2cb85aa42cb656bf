//! Meal Planner Library
//!
//! Recipes, meal plans and the shopping lists generated from them.

pub mod build_info;
pub mod db;
pub mod mcp;
pub mod models;
pub mod quantity;
pub mod shopping;
pub mod tools;
