//! Product records mirrored from the Shopify Admin API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// A product synced from Shopify.
///
/// `total_sales` is not supplied by Shopify: it is derived locally by summing
/// this tenant's order line items referencing the product, and is only valid
/// as of the last product sync's re-derivation pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Shopify product id in canonical string form.
    pub shopify_id: String,
    pub title: String,
    pub handle: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub status: Option<String>,
    /// Derived: sum of line-item prices referencing this product.
    pub total_sales: Decimal,
    pub shopify_created_at: Option<DateTime<Utc>>,
    pub shopify_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field shape written on each product upsert. `total_sales` is absent on
/// purpose - it is only touched by the re-derivation pass.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub shopify_id: String,
    pub title: String,
    pub handle: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub status: Option<String>,
    pub shopify_created_at: Option<DateTime<Utc>>,
    pub shopify_updated_at: Option<DateTime<Utc>>,
}
