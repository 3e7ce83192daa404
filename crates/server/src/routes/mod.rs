//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                     - Liveness check
//! GET  /health/ready                               - Readiness check (pings the database)
//! GET  /api/health                                 - Liveness check, API prefix
//!
//! # Tenants (under /api)
//! POST /api/tenants                                - Onboard a store
//! GET  /api/tenants                                - List tenants with record counts
//! GET  /api/tenants/{id}                           - Tenant detail with record counts
//! PUT  /api/tenants/{id}                           - Partial update
//!
//! # Sync
//! POST /api/tenants/{id}/sync                      - Full sync in the background (202)
//! POST /api/tenants/{id}/sync/customers            - Customer sync, inline
//! POST /api/tenants/{id}/sync/orders               - Order sync, inline
//! POST /api/tenants/{id}/sync/products             - Product sync, inline
//!
//! # Insights
//! GET  /api/tenants/{id}/orders                    - Recent orders
//! GET  /api/tenants/{id}/insights/overview         - Headline numbers
//! GET  /api/tenants/{id}/insights/orders-by-date   - Daily buckets in a window
//! GET  /api/tenants/{id}/insights/top-customers    - Customers by lifetime spend
//! GET  /api/tenants/{id}/insights/revenue-trend    - Daily revenue in a window
//! GET  /api/tenants/{id}/insights/order-count-trend - Daily order counts in a window
//! ```

pub mod insights;
pub mod sync;
pub mod tenants;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Build the `/api` router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(tenants::router())
        .merge(sync::router())
        .merge(insights::router())
}

async fn health() -> &'static str {
    "ok"
}
