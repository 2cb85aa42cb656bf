//! Database module
//!
//! SQLite connection pool, schema migrations and path configuration.

pub mod connection;
pub mod migrations;

pub use connection::{default_database_path, Database, DbError, DbResult};
