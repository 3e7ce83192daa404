//! Customer records mirrored from the Shopify Admin API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// A customer synced from Shopify.
///
/// `total_spent` and `orders_count` are overwritten wholesale from the
/// upstream snapshot on each sync - they are never computed locally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Shopify customer id in canonical string form.
    pub shopify_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub total_spent: Decimal,
    pub orders_count: i32,
    pub shopify_created_at: Option<DateTime<Utc>>,
    pub shopify_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Display name joined from name parts, "N/A" when both are absent.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

/// Joins optional name parts into a display name, "N/A" when both are
/// absent. Also used for names projected straight out of query rows.
#[must_use]
pub fn display_name(first: Option<&str>, last: Option<&str>) -> String {
    let name = [first, last]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() { "N/A".to_string() } else { name }
}

/// Field shape written on each customer upsert.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub shopify_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub total_spent: Decimal,
    pub orders_count: i32,
    pub shopify_created_at: Option<DateTime<Utc>>,
    pub shopify_updated_at: Option<DateTime<Utc>>,
}
