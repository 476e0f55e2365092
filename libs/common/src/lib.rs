//! Common library for the users microservice
//!
//! This crate provides the shared infrastructure used by the HTTP service
//! and the RPC worker: database connection pooling with bounded startup
//! retries, the AMQP broker connection, and the error types for both.

pub mod broker;
pub mod database;
pub mod error;
