//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use karthik_core::{MessageBody, NewProduct, Product, ProductId, ProductUpdate};

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// `POST /api/products`; an id is generated when the body has none.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(product): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    product
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let created = ProductRepository::new(state.pool())
        .create(product)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::BadRequest("Product id already exists".into()),
            other => other.into(),
        })?;

    tracing::info!(product_id = %created.id, "Product created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/products/{id}`
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    update
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let product = ProductRepository::new(state.pool())
        .update(&id, &update)
        .await
        .map_err(not_found)?;
    Ok(Json(product))
}

/// `DELETE /api/products/{id}`
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageBody>> {
    ProductRepository::new(state.pool())
        .delete(&id)
        .await
        .map_err(not_found)?;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(MessageBody {
        message: "Product deleted".into(),
    }))
}

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Product not found".into()),
        other => other.into(),
    }
}
