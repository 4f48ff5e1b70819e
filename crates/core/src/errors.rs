//! Core error types for MarketPulse.
//!
//! This module defines storage-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the temporal layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Invalid market configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upstream fetch failed: {0}")]
    Fetch(String),
}

/// Storage-agnostic error type for key/value store operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Errors raised while loading market and region definitions.
///
/// These are only produced when a `MarketTable` is built. Queries against a
/// validated table never fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Market {market}: {window} window is inverted or empty ({open} >= {close})")]
    InvertedWindow {
        market: String,
        window: &'static str,
        open: f64,
        close: f64,
    },

    #[error("Market {market}: {window} boundary {value} is outside the allowed range")]
    OutOfRange {
        market: String,
        window: &'static str,
        value: f64,
    },

    #[error("Market {market}: {window} window is only half configured")]
    IncompleteWindow {
        market: String,
        window: &'static str,
    },

    #[error("Market {market}: {first} and {second} windows overlap")]
    OverlappingWindows {
        market: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("Market {market}: futures open hour set without futures support")]
    FuturesWithoutSupport { market: String },

    #[error("Market {0} is defined more than once")]
    DuplicateMarket(String),

    #[error("Region {region} references unconfigured market {market}")]
    UnknownRegionMarket { region: String, market: String },
}

/// Validation errors for caller input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Unknown market identifier '{0}'")]
    UnknownMarket(String),

    #[error("Unknown region identifier '{0}'")]
    UnknownRegion(String),

    #[error("Unknown feed identifier '{0}'")]
    UnknownFeed(String),

    #[error("TTL must be greater than zero minutes")]
    ZeroTtl,

    #[error("Failed to (de)serialize cached value: {0}")]
    Serialization(String),
}

// === From implementations for common error types ===

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::Serialization(err.to_string()))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Database(DatabaseError::Internal(err.to_string()))
    }
}

