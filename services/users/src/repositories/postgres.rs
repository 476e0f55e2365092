//! PostgreSQL-backed user repository

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::models::{NewUser, Permissions, UpdateUser, User};
use crate::repositories::{RepositoryError, UserRepository};

/// Postgres error code for a unique constraint violation
const UNIQUE_VIOLATION: &str = "23505";

/// User repository over a PostgreSQL pool
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                permissions TEXT NOT NULL,
                password TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_store_error)?;

        Ok(())
    }
}

fn map_row(row: &PgRow) -> Result<User, RepositoryError> {
    let permissions: String = row.try_get("permissions").map_err(map_store_error)?;
    let permissions: Permissions = permissions
        .parse()
        .map_err(|e: crate::models::ParsePermissionsError| RepositoryError::Store(e.to_string()))?;

    Ok(User {
        id: row.try_get("id").map_err(map_store_error)?,
        name: row.try_get("name").map_err(map_store_error)?,
        permissions,
        password: row.try_get("password").map_err(map_store_error)?,
    })
}

/// Map a sqlx error to the repository taxonomy; unique violations
/// become `Conflict`, everything else `Store`
fn map_store_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return RepositoryError::Conflict;
        }
    }
    RepositoryError::Store(e.to_string())
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        info!("Creating new user: {}", new_user.name);

        let row = sqlx::query(
            r#"
            INSERT INTO users (name, permissions, password)
            VALUES ($1, $2, $3)
            RETURNING id, name, permissions, password
            "#,
        )
        .bind(&new_user.name)
        .bind(new_user.permissions.as_str())
        .bind(&new_user.password)
        .fetch_one(&self.pool)
        .await
        .map_err(map_store_error)?;

        map_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, permissions, password
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_error)?;

        row.as_ref().map(map_row).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, permissions, password
            FROM users
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_error)?;

        row.as_ref().map(map_row).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, permissions, password
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_store_error)?;

        rows.iter().map(map_row).collect()
    }

    async fn replace(&self, id: i64, user: &NewUser) -> Result<User, RepositoryError> {
        info!("Replacing user {}", id);

        let row = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, permissions = $3, password = $4
            WHERE id = $1
            RETURNING id, name, permissions, password
            "#,
        )
        .bind(id)
        .bind(&user.name)
        .bind(user.permissions.as_str())
        .bind(&user.password)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_error)?;

        match row {
            Some(row) => map_row(&row),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn patch(&self, id: i64, update: &UpdateUser) -> Result<User, RepositoryError> {
        info!("Patching user {}", id);

        // One statement; COALESCE keeps columns whose field was not supplied
        let row = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                permissions = COALESCE($3, permissions),
                password = COALESCE($4, password)
            WHERE id = $1
            RETURNING id, name, permissions, password
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.permissions.map(|p| p.as_str()))
        .bind(update.password.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_error)?;

        match row {
            Some(row) => map_row(&row),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        info!("Deleting user {}", id);

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_store_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
