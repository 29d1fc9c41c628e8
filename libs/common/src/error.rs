//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the application.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Failure of a single subscriber to accept an event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The push connection behind the subscriber is gone
    #[error("subscriber connection closed")]
    Closed,

    /// The subscriber refused the event
    #[error("subscriber rejected event: {0}")]
    Rejected(String),
}

/// Error raised by the broadcaster before any subscriber is called
#[derive(Error, Debug)]
pub enum BroadcastError {
    /// The event payload could not be serialized
    #[error("Failed to serialize event payload: {0}")]
    Serialize(#[from] serde_json::Error),
}
