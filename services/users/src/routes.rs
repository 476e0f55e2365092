//! Users service routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    AppState,
    error::ApiError,
    models::{LoginRequest, NewUser, UpdateUser},
    repositories::RepositoryError,
};

/// Create the router for the users service
///
/// The CORS and tracing layers live here so tests drive the same stack as
/// the binary.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/login", post(login))
        .route("/api/users", post(create_user).get(list_users))
        .route(
            "/api/users/:id",
            get(get_user)
                .put(replace_user)
                .patch(patch_user)
                .delete(delete_user),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Map a repository error to its HTTP representation; the 409 literal is
/// operation-specific
fn map_repository_error(e: RepositoryError, conflict_message: &'static str) -> ApiError {
    match e {
        RepositoryError::NotFound => ApiError::NotFound,
        RepositoryError::Conflict => ApiError::Conflict(conflict_message),
        RepositoryError::Store(msg) => {
            tracing::error!("Store failure: {}", msg);
            ApiError::InternalServerError
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok"
    }))
}

/// Authenticate a user by name and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .find_by_name(&payload.name)
        .await
        .map_err(|e| map_repository_error(e, ""))?;

    // Unknown name and wrong password are indistinguishable to the caller
    match user {
        Some(user) if user.password == payload.password => Ok(Json(user)),
        _ => Err(ApiError::Unauthorized),
    }
}

/// Create a new user
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .create(&payload)
        .await
        .map_err(|e| map_repository_error(e, "User could not be created"))?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Get all users, ascending by id
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .users
        .list()
        .await
        .map_err(|e| map_repository_error(e, ""))?;

    Ok(Json(users))
}

/// Get a user by id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .find_by_id(id)
        .await
        .map_err(|e| map_repository_error(e, ""))?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(user))
}

/// Replace all mutable fields of a user
pub async fn replace_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .replace(id, &payload)
        .await
        .map_err(|e| map_repository_error(e, "Failed to update user"))?;

    Ok(Json(user))
}

/// Update only the supplied fields of a user
pub async fn patch_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .patch(id, &payload)
        .await
        .map_err(|e| map_repository_error(e, "Failed to update user"))?;

    Ok(Json(user))
}

/// Delete a user by id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .users
        .delete(id)
        .await
        .map_err(|e| map_repository_error(e, ""))?;

    Ok(StatusCode::NO_CONTENT)
}
