//! Admin login.

use axum::{Json, extract::State};
use tracing::instrument;

use karthik_core::password::{PasswordCheck, check_password, hash_password};
use karthik_core::{AdminCredentials, AdminLoginReply};

use crate::db::AdminRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// `POST /api/admin/login`
///
/// A stored plain-text password that matches is replaced with its hash.
#[instrument(skip_all, fields(userid = %credentials.userid))]
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<AdminCredentials>,
) -> Result<Json<AdminLoginReply>> {
    let repo = AdminRepository::new(state.pool());
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let stored = repo
        .get_password(&credentials.userid)
        .await?
        .ok_or_else(invalid)?;

    match check_password(&credentials.password, &stored) {
        PasswordCheck::Valid => {}
        PasswordCheck::ValidLegacy => {
            let hash = hash_password(&credentials.password)?;
            repo.set_password(&credentials.userid, &hash).await?;
            tracing::info!("Upgraded legacy admin password");
        }
        PasswordCheck::Invalid => {
            tracing::info!("Rejected admin login");
            return Err(invalid());
        }
    }

    Ok(Json(AdminLoginReply {
        success: true,
        message: "Login successful".into(),
    }))
}
