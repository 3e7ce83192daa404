//! Order repository.
//!
//! Orders follow the same `(tenant_id, shopify_id)` upsert discipline as the
//! other mirrors. Line items have no stable upstream identity worth tracking,
//! so each order sync deletes and recreates them inside one transaction; a
//! reader never observes an order with a half-written line-item set.

use sqlx::PgPool;
use uuid::Uuid;

use shoplens_core::{NewLineItem, NewOrder, Order};

use super::RepositoryError;

const ORDER_COLUMNS: &str = "id, tenant_id, shopify_id, order_number, customer_id, email, \
     financial_status, fulfillment_status, total_price, subtotal_price, total_tax, currency, \
     order_date, shopify_created_at, shopify_updated_at, created_at, updated_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Upsert one order snapshot for a tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, tenant_id: Uuid, new: &NewOrder) -> Result<Order, RepositoryError> {
        let query = format!(
            "INSERT INTO orders
                 (tenant_id, shopify_id, order_number, customer_id, email,
                  financial_status, fulfillment_status, total_price, subtotal_price,
                  total_tax, currency, order_date, shopify_created_at, shopify_updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             ON CONFLICT (tenant_id, shopify_id) DO UPDATE SET
                 order_number = EXCLUDED.order_number,
                 customer_id = EXCLUDED.customer_id,
                 email = EXCLUDED.email,
                 financial_status = EXCLUDED.financial_status,
                 fulfillment_status = EXCLUDED.fulfillment_status,
                 total_price = EXCLUDED.total_price,
                 subtotal_price = EXCLUDED.subtotal_price,
                 total_tax = EXCLUDED.total_tax,
                 currency = EXCLUDED.currency,
                 order_date = EXCLUDED.order_date,
                 shopify_created_at = EXCLUDED.shopify_created_at,
                 shopify_updated_at = EXCLUDED.shopify_updated_at,
                 updated_at = NOW()
             RETURNING {ORDER_COLUMNS}"
        );

        let order = sqlx::query_as::<_, Order>(&query)
            .bind(tenant_id)
            .bind(&new.shopify_id)
            .bind(&new.order_number)
            .bind(new.customer_id)
            .bind(new.email.as_deref())
            .bind(new.financial_status.as_deref())
            .bind(new.fulfillment_status.as_deref())
            .bind(new.total_price)
            .bind(new.subtotal_price)
            .bind(new.total_tax)
            .bind(&new.currency)
            .bind(new.order_date)
            .bind(new.shopify_created_at)
            .bind(new.shopify_updated_at)
            .fetch_one(self.pool)
            .await?;

        Ok(order)
    }

    /// Replace an order's line items with a fresh set, atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction rolls back and the previous line items survive.
    pub async fn replace_line_items(
        &self,
        order_id: Uuid,
        items: &[NewLineItem],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM order_line_items WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO order_line_items
                     (order_id, shopify_id, title, quantity, price, product_id)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(order_id)
            .bind(&item.shopify_id)
            .bind(&item.title)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.product_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
