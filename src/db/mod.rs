//! Database module for Redwing.
//!
//! Provides SQLite storage with automatic migrations.

mod models;
mod seed;
mod store;

pub use models::*;
pub use seed::*;
pub use store::*;
