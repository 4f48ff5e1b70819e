//! SQLite storage implementation for MarketPulse.
//!
//! Provides the durable `KeyValueStore` behind the freshness cache:
//! - Database connection pooling and management
//! - Diesel migrations
//! - A single-writer actor serializing all writes
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! `core` is database-agnostic and works with the `KeyValueStore` trait.
//!
//! ```text
//!        core (cache, freshness)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod kv;
pub mod schema;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use kv::SqliteKeyValueStore;

// Re-export from marketpulse-core for convenience
pub use marketpulse_core::errors::{DatabaseError, Error, Result};
