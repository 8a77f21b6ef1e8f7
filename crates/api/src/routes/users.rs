//! Shopper account route handlers.
//!
//! Register and login share `POST /api/users`, selected by the `action`
//! field of the body.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use karthik_core::password::{PasswordCheck, check_password, hash_password};
use karthik_core::{
    AccountReply, MessageBody, ProfileUpdateRequest, Registration, UserAction, UserCredentials,
    Username,
};

use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query string for `GET` and `DELETE /api/users`.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub username: Option<Username>,
    #[serde(default)]
    pub all: bool,
}

/// `POST /api/users`
#[instrument(skip_all)]
pub async fn action(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UserAction>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountReply>)> {
    let Json(action) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    match action {
        UserAction::Register(registration) => register(&state, &registration).await,
        UserAction::Login(credentials) => login(&state, &credentials).await,
    }
}

async fn register(
    state: &AppState,
    registration: &Registration,
) -> Result<(StatusCode, Json<AccountReply>)> {
    registration
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let hash = hash_password(&registration.password)?;
    let user = UserRepository::new(state.pool())
        .create(registration, &hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::BadRequest("Username already exists".into()),
            other => other.into(),
        })?;

    tracing::info!(username = %user.username, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(AccountReply {
            success: true,
            message: "User registered successfully".into(),
            user,
        }),
    ))
}

async fn login(
    state: &AppState,
    credentials: &UserCredentials,
) -> Result<(StatusCode, Json<AccountReply>)> {
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let (user, stored) = UserRepository::new(state.pool())
        .get_with_password(&credentials.username)
        .await?
        .ok_or_else(invalid)?;

    if check_password(&credentials.password, &stored) != PasswordCheck::Valid {
        tracing::info!(username = %credentials.username, "Rejected login");
        return Err(invalid());
    }

    Ok((
        StatusCode::OK,
        Json(AccountReply {
            success: true,
            message: "Login successful".into(),
            user,
        }),
    ))
}

/// `GET /api/users?username=` or `GET /api/users?all=true`
#[instrument(skip(state))]
pub async fn get(State(state): State<AppState>, Query(query): Query<UserQuery>) -> Result<Response> {
    let repo = UserRepository::new(state.pool());

    if query.all {
        return Ok(Json(repo.list().await?).into_response());
    }

    let Some(username) = query.username else {
        return Err(AppError::BadRequest(
            "Username parameter or all=true is required".into(),
        ));
    };

    let user = repo
        .get(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(user).into_response())
}

/// `PUT /api/users`
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<AccountReply>> {
    request
        .update
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let hash = request
        .update
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let user = UserRepository::new(state.pool())
        .update(&request.username, &request.update, hash.as_deref())
        .await
        .map_err(user_not_found)?;

    Ok(Json(AccountReply {
        success: true,
        message: "User updated successfully".into(),
        user,
    }))
}

/// `DELETE /api/users?username=`
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<MessageBody>> {
    let username = query
        .username
        .ok_or_else(|| AppError::BadRequest("Username parameter is required".into()))?;

    UserRepository::new(state.pool())
        .delete(&username)
        .await
        .map_err(user_not_found)?;

    tracing::info!(%username, "User deleted");
    Ok(Json(MessageBody {
        message: "User deleted successfully".into(),
    }))
}

fn user_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("User not found".into()),
        other => other.into(),
    }
}
