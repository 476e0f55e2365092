//! Data-access contract for user records
//!
//! The repository is a trait so the HTTP layer and the RPC worker take an
//! injectable handle: PostgreSQL in production, the in-memory adapter in
//! tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewUser, UpdateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserRepository;
pub use postgres::PgUserRepository;

/// Errors surfaced by repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No record for the given id
    #[error("user not found")]
    NotFound,

    /// Write would violate the name uniqueness constraint
    #[error("user name already taken")]
    Conflict,

    /// Backend failure (connection, query, row decoding)
    #[error("store error: {0}")]
    Store(String),
}

/// Repository of user records
///
/// Mutating operations are atomic with respect to the uniqueness
/// constraint: a conflicting write leaves no partial state behind.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; `Conflict` if the name is taken
    async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError>;

    /// Find a user by id
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;

    /// Find a user by name (login path)
    async fn find_by_name(&self, name: &str) -> Result<Option<User>, RepositoryError>;

    /// All users, ascending by id
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    /// Overwrite all mutable fields; `NotFound` | `Conflict`
    async fn replace(&self, id: i64, user: &NewUser) -> Result<User, RepositoryError>;

    /// Update only the supplied fields; `NotFound` | `Conflict`.
    /// A patch with no fields set returns the current record unchanged.
    async fn patch(&self, id: i64, update: &UpdateUser) -> Result<User, RepositoryError>;

    /// Remove the record permanently; `NotFound` when absent
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
}
