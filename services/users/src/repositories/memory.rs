//! In-memory user repository
//!
//! Test and development substitute for the PostgreSQL adapter with the same
//! observable semantics: ascending-id listing, conflict-before-mutation, and
//! ids that are never reused.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::{RepositoryError, UserRepository};

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    next_id: i64,
}

/// User repository backed by an in-process map
#[derive(Default)]
pub struct InMemoryUserRepository {
    inner: Mutex<Inner>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn name_taken(inner: &Inner, name: &str, except_id: Option<i64>) -> bool {
    inner
        .users
        .values()
        .any(|u| u.name == name && Some(u.id) != except_id)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let mut inner = self.lock();

        if name_taken(&inner, &new_user.name, None) {
            return Err(RepositoryError::Conflict);
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            name: new_user.name.clone(),
            permissions: new_user.permissions,
            password: new_user.password.clone(),
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().users.values().find(|u| u.name == name).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        // BTreeMap iterates in key order, so the listing is ascending by id
        Ok(self.lock().users.values().cloned().collect())
    }

    async fn replace(&self, id: i64, user: &NewUser) -> Result<User, RepositoryError> {
        let mut inner = self.lock();

        if !inner.users.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if name_taken(&inner, &user.name, Some(id)) {
            return Err(RepositoryError::Conflict);
        }

        let replaced = User {
            id,
            name: user.name.clone(),
            permissions: user.permissions,
            password: user.password.clone(),
        };
        inner.users.insert(id, replaced.clone());

        Ok(replaced)
    }

    async fn patch(&self, id: i64, update: &UpdateUser) -> Result<User, RepositoryError> {
        let mut inner = self.lock();

        let current = inner.users.get(&id).ok_or(RepositoryError::NotFound)?.clone();

        if let Some(name) = &update.name {
            if name_taken(&inner, name, Some(id)) {
                return Err(RepositoryError::Conflict);
            }
        }

        let patched = User {
            id,
            name: update.name.clone().unwrap_or(current.name),
            permissions: update.permissions.unwrap_or(current.permissions),
            password: update.password.clone().unwrap_or(current.password),
        };
        inner.users.insert(id, patched.clone());

        Ok(patched)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        match self.lock().users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}
