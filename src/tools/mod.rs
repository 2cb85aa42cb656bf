//! Meal planner tools
//!
//! Operation layer behind the MCP tools. Each function opens a pooled
//! connection, calls into the models and returns a serializable response
//! or a human-readable error.

pub mod grocery_stores;
pub mod ingredients;
pub mod meal_plans;
pub mod quantities;
pub mod recipes;
pub mod shopping_lists;
pub mod status;

use serde::Serialize;

/// Response for a successful delete
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

impl DeleteResponse {
    pub fn new(deleted_id: i64) -> Self {
        Self {
            success: true,
            deleted_id,
        }
    }
}

/// Clamp paging arguments to sane bounds
pub(crate) fn page(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, 200), offset.max(0))
}

#[cfg(test)]
pub(crate) fn test_database() -> (tempfile::TempDir, crate::db::Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = crate::db::Database::new(dir.path().join("tools.db")).unwrap();
    db.with_conn(crate::db::migrations::run_migrations).unwrap();
    (dir, db)
}
