//! Sync trigger handlers.
//!
//! A full sync can take minutes for large stores, so `POST /tenants/{id}/sync`
//! spawns it in the background and answers 202 immediately. The per-entity
//! endpoints run inline and return the summary.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use serde_json::json;
use tracing::{error, info, instrument};
use uuid::Uuid;

use shoplens_core::{SyncOutcome, Tenant};

use crate::db::TenantRepository;
use crate::error::AppError;
use crate::state::AppState;

/// Build the sync router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tenants/{id}/sync", post(sync_all))
        .route("/tenants/{id}/sync/customers", post(sync_customers))
        .route("/tenants/{id}/sync/orders", post(sync_orders))
        .route("/tenants/{id}/sync/products", post(sync_products))
}

/// Load the tenant and reject syncs for demo-token tenants.
async fn ensure_syncable(state: &AppState, id: Uuid) -> Result<Tenant, AppError> {
    let tenant = TenantRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tenant {id}")))?;

    if tenant.is_demo() {
        return Err(AppError::BadRequest(
            "Demo tenants cannot sync against the live Shopify API".to_string(),
        ));
    }
    Ok(tenant)
}

/// Kick off a full sync in the background.
///
/// # Errors
///
/// Returns 404 for unknown tenants and 400 for demo tenants.
#[instrument(skip(state))]
pub async fn sync_all(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let tenant = ensure_syncable(&state, id).await?;

    let ingestion = state.ingestion().clone();
    tokio::spawn(async move {
        let report = ingestion.sync_all(tenant.id).await;
        if report.success {
            info!(tenant_id = %tenant.id, "Background sync complete");
        } else {
            error!(tenant_id = %tenant.id, "Background sync finished with failures");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Sync started",
            "tenantId": id,
        })),
    ))
}

/// Sync customers inline and return the summary.
///
/// # Errors
///
/// Returns 404 for unknown tenants, 400 for demo tenants, 502 when the
/// upstream fetch fails.
#[instrument(skip(state))]
pub async fn sync_customers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SyncOutcome>, AppError> {
    ensure_syncable(&state, id).await?;
    let outcome = state.ingestion().sync_customers(id).await?;
    Ok(Json(outcome))
}

/// Sync orders inline and return the summary.
///
/// # Errors
///
/// Same as [`sync_customers`].
#[instrument(skip(state))]
pub async fn sync_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SyncOutcome>, AppError> {
    ensure_syncable(&state, id).await?;
    let outcome = state.ingestion().sync_orders(id).await?;
    Ok(Json(outcome))
}

/// Sync products inline and return the summary.
///
/// # Errors
///
/// Same as [`sync_customers`].
#[instrument(skip(state))]
pub async fn sync_products(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SyncOutcome>, AppError> {
    ensure_syncable(&state, id).await?;
    let outcome = state.ingestion().sync_products(id).await?;
    Ok(Json(outcome))
}
