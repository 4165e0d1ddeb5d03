mod repository;

pub use repository::*;

/// SQL migration for the initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Drops every table created by the migrations
pub const SCHEMA_TEARDOWN: &str = include_str!("migrations/teardown.sql");
