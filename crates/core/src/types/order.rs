//! Order and line-item records mirrored from the Shopify Admin API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// An order synced from Shopify.
///
/// `customer_id` is a weak reference resolved by `(tenant_id, shopify_id)`
/// lookup against previously synced customers; it is null when the customer
/// is not yet known locally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Order {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Shopify order id in canonical string form.
    pub shopify_id: String,
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub email: Option<String>,
    pub financial_status: Option<String>,
    pub fulfillment_status: Option<String>,
    pub total_price: Decimal,
    pub subtotal_price: Decimal,
    pub total_tax: Decimal,
    pub currency: String,
    pub order_date: DateTime<Utc>,
    pub shopify_created_at: Option<DateTime<Utc>>,
    pub shopify_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item owned by exactly one order.
///
/// Line items are fully replaced on every order sync, so the row id is not a
/// stable identity across syncs. `product_id` is a weak reference like
/// `Order::customer_id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct OrderLineItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub shopify_id: String,
    /// Title snapshot at order time.
    pub title: String,
    pub quantity: i32,
    pub price: Decimal,
    pub product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Field shape written on each order upsert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub shopify_id: String,
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub email: Option<String>,
    pub financial_status: Option<String>,
    pub fulfillment_status: Option<String>,
    pub total_price: Decimal,
    pub subtotal_price: Decimal,
    pub total_tax: Decimal,
    pub currency: String,
    pub order_date: DateTime<Utc>,
    pub shopify_created_at: Option<DateTime<Utc>>,
    pub shopify_updated_at: Option<DateTime<Utc>>,
}

/// Field shape for one recreated line item.
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub shopify_id: String,
    pub title: String,
    pub quantity: i32,
    pub price: Decimal,
    pub product_id: Option<Uuid>,
}
