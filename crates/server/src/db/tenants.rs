//! Tenant repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shoplens_core::{NewTenant, Tenant, TenantUpdate};

use super::RepositoryError;

const TENANT_COLUMNS: &str =
    "id, shop_domain, access_token, name, is_active, created_at, updated_at";

/// A tenant joined with its synced record counts, for the dashboard list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TenantOverview {
    pub id: Uuid,
    pub shop_domain: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_count: i64,
    pub order_count: i64,
    pub product_count: i64,
}

/// Repository for tenant database operations.
pub struct TenantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TenantRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when the shop domain is already
    /// onboarded, `RepositoryError::Database` for other query failures.
    pub async fn create(&self, new: &NewTenant) -> Result<Tenant, RepositoryError> {
        let query = format!(
            "INSERT INTO tenants (shop_domain, access_token, name)
             VALUES ($1, $2, $3)
             RETURNING {TENANT_COLUMNS}"
        );

        sqlx::query_as::<_, Tenant>(&query)
            .bind(&new.shop_domain)
            .bind(&new.access_token)
            .bind(&new.name)
            .fetch_one(self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    RepositoryError::Conflict(format!(
                        "tenant with shop domain {} already exists",
                        new.shop_domain
                    ))
                }
                _ => RepositoryError::Database(e),
            })
    }

    /// Fetch a tenant by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, RepositoryError> {
        let query = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1");

        let tenant = sqlx::query_as::<_, Tenant>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(tenant)
    }

    /// Fetch a tenant by normalized shop domain.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_domain(&self, shop_domain: &str) -> Result<Option<Tenant>, RepositoryError> {
        let query = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE shop_domain = $1");

        let tenant = sqlx::query_as::<_, Tenant>(&query)
            .bind(shop_domain)
            .fetch_optional(self.pool)
            .await?;

        Ok(tenant)
    }

    /// List all tenants with their synced record counts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_counts(&self) -> Result<Vec<TenantOverview>, RepositoryError> {
        let overviews = sqlx::query_as::<_, TenantOverview>(
            r"
            SELECT t.id, t.shop_domain, t.name, t.is_active,
                   t.created_at, t.updated_at,
                   (SELECT COUNT(*) FROM customers c WHERE c.tenant_id = t.id) AS customer_count,
                   (SELECT COUNT(*) FROM orders o WHERE o.tenant_id = t.id) AS order_count,
                   (SELECT COUNT(*) FROM products p WHERE p.tenant_id = t.id) AS product_count
            FROM tenants t
            ORDER BY t.created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(overviews)
    }

    /// Fetch one tenant with its synced record counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_overview(&self, id: Uuid) -> Result<Option<TenantOverview>, RepositoryError> {
        let overview = sqlx::query_as::<_, TenantOverview>(
            r"
            SELECT t.id, t.shop_domain, t.name, t.is_active,
                   t.created_at, t.updated_at,
                   (SELECT COUNT(*) FROM customers c WHERE c.tenant_id = t.id) AS customer_count,
                   (SELECT COUNT(*) FROM orders o WHERE o.tenant_id = t.id) AS order_count,
                   (SELECT COUNT(*) FROM products p WHERE p.tenant_id = t.id) AS product_count
            FROM tenants t
            WHERE t.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(overview)
    }

    /// List active tenants, oldest first. Used by the scheduler.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Tenant>, RepositoryError> {
        let query = format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE is_active = TRUE ORDER BY created_at ASC"
        );

        let tenants = sqlx::query_as::<_, Tenant>(&query)
            .fetch_all(self.pool)
            .await?;

        Ok(tenants)
    }

    /// Apply a partial update. `None` fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when the tenant does not exist,
    /// `RepositoryError::Database` for other query failures.
    pub async fn update(&self, id: Uuid, update: &TenantUpdate) -> Result<Tenant, RepositoryError> {
        let query = format!(
            "UPDATE tenants
             SET name = COALESCE($2, name),
                 is_active = COALESCE($3, is_active),
                 access_token = COALESCE($4, access_token),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {TENANT_COLUMNS}"
        );

        sqlx::query_as::<_, Tenant>(&query)
            .bind(id)
            .bind(update.name.as_deref())
            .bind(update.is_active)
            .bind(update.access_token.as_deref())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
