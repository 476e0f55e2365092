//! Users service library
//!
//! Exposes the domain (models, repositories) and the HTTP surface so the
//! RPC worker and the integration tests can reuse them.

pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;

pub use state::AppState;
