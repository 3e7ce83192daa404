//! Customer repository.
//!
//! Customers are written with an upsert keyed on `(tenant_id, shopify_id)`:
//! re-syncing the same upstream record overwrites every mirrored column and
//! never creates a duplicate row.

use sqlx::PgPool;
use uuid::Uuid;

use shoplens_core::{Customer, NewCustomer};

use super::RepositoryError;

const CUSTOMER_COLUMNS: &str = "id, tenant_id, shopify_id, email, first_name, last_name, \
     total_spent, orders_count, shopify_created_at, shopify_updated_at, created_at, updated_at";

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Upsert one customer snapshot for a tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        tenant_id: Uuid,
        new: &NewCustomer,
    ) -> Result<Customer, RepositoryError> {
        let query = format!(
            "INSERT INTO customers
                 (tenant_id, shopify_id, email, first_name, last_name,
                  total_spent, orders_count, shopify_created_at, shopify_updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (tenant_id, shopify_id) DO UPDATE SET
                 email = EXCLUDED.email,
                 first_name = EXCLUDED.first_name,
                 last_name = EXCLUDED.last_name,
                 total_spent = EXCLUDED.total_spent,
                 orders_count = EXCLUDED.orders_count,
                 shopify_created_at = EXCLUDED.shopify_created_at,
                 shopify_updated_at = EXCLUDED.shopify_updated_at,
                 updated_at = NOW()
             RETURNING {CUSTOMER_COLUMNS}"
        );

        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(tenant_id)
            .bind(&new.shopify_id)
            .bind(new.email.as_deref())
            .bind(new.first_name.as_deref())
            .bind(new.last_name.as_deref())
            .bind(new.total_spent)
            .bind(new.orders_count)
            .bind(new.shopify_created_at)
            .bind(new.shopify_updated_at)
            .fetch_one(self.pool)
            .await?;

        Ok(customer)
    }

    /// Resolve a Shopify customer id to the local row id for this tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_id_by_shopify_id(
        &self,
        tenant_id: Uuid,
        shopify_id: &str,
    ) -> Result<Option<Uuid>, RepositoryError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM customers WHERE tenant_id = $1 AND shopify_id = $2",
        )
        .bind(tenant_id)
        .bind(shopify_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(id)
    }
}
