//! Product repository.
//!
//! Product upserts never touch `total_sales`; that column is owned by the
//! re-derivation pass which recomputes it for the whole tenant after each
//! product sync.

use sqlx::PgPool;
use uuid::Uuid;

use shoplens_core::{NewProduct, Product};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "id, tenant_id, shopify_id, title, handle, description, vendor, \
     product_type, status, total_sales, shopify_created_at, shopify_updated_at, \
     created_at, updated_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Upsert one product snapshot for a tenant. Leaves `total_sales` alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        tenant_id: Uuid,
        new: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let query = format!(
            "INSERT INTO products
                 (tenant_id, shopify_id, title, handle, description, vendor,
                  product_type, status, shopify_created_at, shopify_updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (tenant_id, shopify_id) DO UPDATE SET
                 title = EXCLUDED.title,
                 handle = EXCLUDED.handle,
                 description = EXCLUDED.description,
                 vendor = EXCLUDED.vendor,
                 product_type = EXCLUDED.product_type,
                 status = EXCLUDED.status,
                 shopify_created_at = EXCLUDED.shopify_created_at,
                 shopify_updated_at = EXCLUDED.shopify_updated_at,
                 updated_at = NOW()
             RETURNING {PRODUCT_COLUMNS}"
        );

        let product = sqlx::query_as::<_, Product>(&query)
            .bind(tenant_id)
            .bind(&new.shopify_id)
            .bind(&new.title)
            .bind(new.handle.as_deref())
            .bind(new.description.as_deref())
            .bind(new.vendor.as_deref())
            .bind(new.product_type.as_deref())
            .bind(new.status.as_deref())
            .bind(new.shopify_created_at)
            .bind(new.shopify_updated_at)
            .fetch_one(self.pool)
            .await?;

        Ok(product)
    }

    /// Resolve a Shopify product id to the local row id for this tenant.
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
            "SELECT id FROM products WHERE tenant_id = $1 AND shopify_id = $2",
        )
        .bind(tenant_id)
        .bind(shopify_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(id)
    }

    /// Recompute `total_sales` for every product of a tenant from the line
    /// items currently on record. Products with no line items reset to zero.
    ///
    /// Returns the number of product rows updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recompute_total_sales(&self, tenant_id: Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products p
            SET total_sales = COALESCE(
                    (SELECT SUM(li.price)
                     FROM order_line_items li
                     WHERE li.product_id = p.id),
                    0),
                updated_at = NOW()
            WHERE p.tenant_id = $1
            ",
        )
        .bind(tenant_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
