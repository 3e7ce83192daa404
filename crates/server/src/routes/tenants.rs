//! Tenant onboarding and management handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::{info, instrument};
use uuid::Uuid;

use shoplens_core::{NewTenant, Tenant, TenantUpdate};

use crate::db::TenantRepository;
use crate::db::tenants::TenantOverview;
use crate::error::AppError;
use crate::state::AppState;

/// Build the tenants router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tenants", get(list_tenants).post(create_tenant))
        .route("/tenants/{id}", get(get_tenant).put(update_tenant))
}

/// Onboard a new tenant.
///
/// Normalizes the shop domain, verifies the credentials against the live API
/// and persists the tenant. No data is synced yet.
///
/// # Errors
///
/// Returns 400 for invalid bodies or failed connection tests, 409 when the
/// domain is already onboarded.
#[instrument(skip(state, body), fields(shop_domain = %body.shop_domain))]
pub async fn create_tenant(
    State(state): State<AppState>,
    Json(body): Json<NewTenant>,
) -> Result<(StatusCode, Json<Tenant>), AppError> {
    let shop_domain = normalize_domain(&body.shop_domain);
    if shop_domain.is_empty() || body.access_token.trim().is_empty() || body.name.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "shopDomain, accessToken and name are required".to_string(),
        ));
    }

    let repo = TenantRepository::new(state.pool());
    if repo.find_by_domain(&shop_domain).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "tenant with shop domain {shop_domain} already exists"
        )));
    }

    let check = state
        .shopify()
        .test_connection(&shop_domain, &body.access_token)
        .await;
    if !check.success {
        return Err(AppError::BadRequest(format!(
            "Could not connect to Shopify: {}",
            check.error.unwrap_or_else(|| "unknown error".to_string())
        )));
    }

    let tenant = repo
        .create(&NewTenant {
            shop_domain,
            access_token: body.access_token,
            name: body.name.trim().to_string(),
        })
        .await?;

    info!(tenant_id = %tenant.id, "Tenant onboarded");
    Ok((StatusCode::CREATED, Json(tenant)))
}

/// List all tenants with their synced record counts.
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn list_tenants(
    State(state): State<AppState>,
) -> Result<Json<Vec<TenantOverview>>, AppError> {
    let tenants = TenantRepository::new(state.pool()).list_with_counts().await?;
    Ok(Json(tenants))
}

/// Fetch one tenant with its synced record counts.
///
/// # Errors
///
/// Returns 404 when the tenant does not exist.
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TenantOverview>, AppError> {
    TenantRepository::new(state.pool())
        .find_overview(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("tenant {id}")))
}

/// Partially update a tenant's name, active flag or access token.
///
/// # Errors
///
/// Returns 404 when the tenant does not exist.
#[instrument(skip(state, body))]
pub async fn update_tenant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TenantUpdate>,
) -> Result<Json<Tenant>, AppError> {
    let tenant = TenantRepository::new(state.pool()).update(id, &body).await?;
    Ok(Json(tenant))
}

/// Strip the scheme and trailing slashes from a user-supplied shop domain.
fn normalize_domain(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_scheme_and_slash() {
        assert_eq!(
            normalize_domain("https://My-Store.myshopify.com/"),
            "my-store.myshopify.com"
        );
        assert_eq!(
            normalize_domain("http://store.myshopify.com"),
            "store.myshopify.com"
        );
        assert_eq!(
            normalize_domain("  store.myshopify.com  "),
            "store.myshopify.com"
        );
    }

    #[test]
    fn normalize_keeps_plain_domains() {
        assert_eq!(
            normalize_domain("store.myshopify.com"),
            "store.myshopify.com"
        );
        assert_eq!(normalize_domain(""), "");
    }
}
