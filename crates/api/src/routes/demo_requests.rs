//! Demo request route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use karthik_core::{DemoRequest, DemoRequestReply, NewDemoRequest};

use crate::db::DemoRequestRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// `POST /api/demo-request`
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<NewDemoRequest>,
) -> Result<(StatusCode, Json<DemoRequestReply>)> {
    let email = request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let data = DemoRequestRepository::new(state.pool())
        .create(&request, &email)
        .await?;

    tracing::info!(email = %data.email.as_str(), "Demo request received");
    Ok((
        StatusCode::CREATED,
        Json(DemoRequestReply {
            success: true,
            message: "Demo request submitted successfully".into(),
            data,
        }),
    ))
}

/// `GET /api/demo-request` and `GET /api/demo-requests`, newest first.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<DemoRequest>>> {
    let requests = DemoRequestRepository::new(state.pool()).list().await?;
    Ok(Json(requests))
}
