//! # engram-storage
//!
//! SQLite persistence layer for the Engram memory graph (spec §4.1).
//! Schema, migrations, full-text index, and the CRUD/search query layer.
//! Single connection, WAL mode: single-writer/multi-reader per the
//! concurrency model of spec §5.

pub mod engine;
pub mod migrations;
pub mod queries;

pub use engine::StorageEngine;

/// Helper to convert a string message into an `EngramError::StorageError`.
pub fn to_storage_err(message: String) -> engram_core::errors::EngramError {
    engram_core::errors::StorageError::SqliteError { message }.into()
}
