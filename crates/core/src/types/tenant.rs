//! Tenant: one onboarded Shopify store connection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token given to seeded demo tenants. Demo tenants are never synced
/// against the live Shopify API.
pub const DEMO_ACCESS_TOKEN: &str = "shpat_demo_token_for_testing_only";

/// An onboarded Shopify store. All synced data is isolated by `id`.
///
/// Created once at onboarding; updated for credential rotation or activation
/// toggling; never hard-deleted by the sync pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Tenant {
    pub id: Uuid,
    /// Shop domain without scheme (e.g., `my-store.myshopify.com`).
    pub shop_domain: String,
    /// Admin API access token. Never serialized into API responses.
    #[serde(skip_serializing)]
    pub access_token: String,
    /// Display name chosen at onboarding.
    pub name: String,
    /// Inactive tenants are skipped by the scheduler.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Whether this is a seeded demo tenant that must not hit the live API.
    #[must_use]
    pub fn is_demo(&self) -> bool {
        self.access_token == DEMO_ACCESS_TOKEN
    }
}

/// Payload for onboarding a new tenant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenant {
    pub shop_domain: String,
    pub access_token: String,
    pub name: String,
}

/// Partial update for an existing tenant. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub access_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_is_never_serialized() {
        let tenant = Tenant {
            id: Uuid::new_v4(),
            shop_domain: "demo.myshopify.com".to_string(),
            access_token: "shpat_super_secret".to_string(),
            name: "Demo".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&tenant).unwrap();
        assert!(!json.contains("shpat_super_secret"));
        assert!(json.contains("demo.myshopify.com"));
    }

    #[test]
    fn tenant_update_accepts_partial_bodies() {
        let update: TenantUpdate = serde_json::from_str(r#"{"isActive": false}"#).unwrap();
        assert_eq!(update.is_active, Some(false));
        assert!(update.name.is_none());
        assert!(update.access_token.is_none());
    }
}
