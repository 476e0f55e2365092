//! Custom error types for the common library
//!
//! This module defines the infrastructure error types shared by the
//! HTTP service and the RPC worker.

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

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Custom error type for broker operations
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Error occurred while connecting to the broker
    #[error("Broker connection error: {0}")]
    Connection(#[source] lapin::Error),

    /// Configuration error
    #[error("Broker configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Type alias for Result with BrokerError
pub type BrokerResult<T> = Result<T, BrokerError>;
