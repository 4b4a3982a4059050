//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite connection pool and migrations
//! - Author and cheep repositories

mod author_repository;
mod cheep_repository;
mod database;
mod models;

pub use author_repository::AuthorRepository;
pub use cheep_repository::CheepRepository;
pub use database::Database;
pub use models::*;
