//! Read-only insight queries for the dashboard.
//!
//! Trend endpoints fetch the raw orders for the requested window and bucket
//! them by calendar day in Rust; the grouping helpers are pure and unit
//! tested. All amounts stay [`Decimal`] end to end.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shoplens_core::display_name;

use crate::db::RepositoryError;

/// Default row limit for top-customer and recent-order queries.
pub const DEFAULT_LIMIT: i64 = 5;

/// Headline numbers for a tenant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_customers: i64,
    pub total_orders: i64,
    pub total_revenue: Decimal,
    /// Revenue divided by order count, rounded to 2 decimal places. Zero when
    /// there are no orders.
    pub average_order_value: Decimal,
}

/// One calendar day's orders within a requested window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    pub order_count: i64,
    pub revenue: Decimal,
}

/// A customer ranked by lifetime spend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub total_spent: Decimal,
    pub orders_count: i32,
}

/// A recent order with its customer name and line items joined in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub email: Option<String>,
    pub total_price: Decimal,
    pub currency: String,
    pub financial_status: Option<String>,
    pub order_date: DateTime<Utc>,
    pub line_items: Vec<RecentLineItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentLineItem {
    pub title: String,
    pub quantity: i32,
    pub price: Decimal,
    /// Title of the linked product, when the weak reference resolves.
    pub product_title: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderPoint {
    order_date: DateTime<Utc>,
    total_price: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct TopCustomerRow {
    id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    total_spent: Decimal,
    orders_count: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct RecentOrderRow {
    id: Uuid,
    order_number: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    total_price: Decimal,
    currency: String,
    financial_status: Option<String>,
    order_date: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct RecentLineItemRow {
    order_id: Uuid,
    title: String,
    quantity: i32,
    price: Decimal,
    product_title: Option<String>,
}

/// Insight queries over the persisted mirrors.
#[derive(Clone)]
pub struct InsightsService {
    pool: PgPool,
}

impl InsightsService {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Headline numbers for a tenant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn overview(&self, tenant_id: Uuid) -> Result<Overview, RepositoryError> {
        let (total_customers, total_orders, total_revenue) =
            sqlx::query_as::<_, (i64, i64, Decimal)>(
                r"
                SELECT
                    (SELECT COUNT(*) FROM customers WHERE tenant_id = $1),
                    (SELECT COUNT(*) FROM orders WHERE tenant_id = $1),
                    (SELECT COALESCE(SUM(total_price), 0) FROM orders WHERE tenant_id = $1)
                ",
            )
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Overview {
            total_customers,
            total_orders,
            total_revenue,
            average_order_value: average_order_value(total_revenue, total_orders),
        })
    }

    /// Orders in `[start, end]` bucketed by calendar day, ascending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn orders_by_date(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DayBucket>, RepositoryError> {
        let points = sqlx::query_as::<_, OrderPoint>(
            r"
            SELECT order_date, total_price
            FROM orders
            WHERE tenant_id = $1 AND order_date >= $2 AND order_date <= $3
            ORDER BY order_date ASC
            ",
        )
        .bind(tenant_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_by_day(&points))
    }

    /// Customers with positive lifetime spend, highest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_customers(
        &self,
        tenant_id: Uuid,
        limit: i64,
    ) -> Result<Vec<TopCustomer>, RepositoryError> {
        let rows = sqlx::query_as::<_, TopCustomerRow>(
            r"
            SELECT id, first_name, last_name, email, total_spent, orders_count
            FROM customers
            WHERE tenant_id = $1 AND total_spent > 0
            ORDER BY total_spent DESC
            LIMIT $2
            ",
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TopCustomer {
                id: row.id,
                name: display_name(row.first_name.as_deref(), row.last_name.as_deref()),
                email: row.email,
                total_spent: row.total_spent,
                orders_count: row.orders_count,
            })
            .collect())
    }

    /// Most recent orders with customer names and line items joined in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn recent_orders(
        &self,
        tenant_id: Uuid,
        limit: i64,
    ) -> Result<Vec<RecentOrder>, RepositoryError> {
        let orders = sqlx::query_as::<_, RecentOrderRow>(
            r"
            SELECT o.id, o.order_number, c.first_name, c.last_name, o.email,
                   o.total_price, o.currency, o.financial_status, o.order_date
            FROM orders o
            LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.tenant_id = $1
            ORDER BY o.order_date DESC
            LIMIT $2
            ",
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, RecentLineItemRow>(
            r"
            SELECT li.order_id, li.title, li.quantity, li.price, p.title AS product_title
            FROM order_line_items li
            LEFT JOIN products p ON p.id = li.product_id
            WHERE li.order_id = ANY($1)
            ",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders
            .into_iter()
            .map(|row| {
                let line_items = items
                    .iter()
                    .filter(|li| li.order_id == row.id)
                    .map(|li| RecentLineItem {
                        title: li.title.clone(),
                        quantity: li.quantity,
                        price: li.price,
                        product_title: li.product_title.clone(),
                    })
                    .collect();
                RecentOrder {
                    id: row.id,
                    order_number: row.order_number,
                    customer_name: display_name(
                        row.first_name.as_deref(),
                        row.last_name.as_deref(),
                    ),
                    email: row.email,
                    total_price: row.total_price,
                    currency: row.currency,
                    financial_status: row.financial_status,
                    order_date: row.order_date,
                    line_items,
                }
            })
            .collect())
    }
}

/// Bucket orders by UTC calendar day. Input must be sorted ascending by
/// `order_date`; days with no orders produce no bucket.
fn group_by_day(points: &[OrderPoint]) -> Vec<DayBucket> {
    let mut buckets: Vec<DayBucket> = Vec::new();
    for point in points {
        let date = point.order_date.date_naive();
        match buckets.last_mut() {
            Some(bucket) if bucket.date == date => {
                bucket.order_count += 1;
                bucket.revenue += point.total_price;
            }
            _ => buckets.push(DayBucket {
                date,
                order_count: 1,
                revenue: point.total_price,
            }),
        }
    }
    buckets
}

fn average_order_value(total_revenue: Decimal, total_orders: i64) -> Decimal {
    if total_orders == 0 {
        Decimal::ZERO
    } else {
        (total_revenue / Decimal::from(total_orders)).round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, price: &str) -> OrderPoint {
        OrderPoint {
            order_date: date.parse().unwrap(),
            total_price: price.parse().unwrap(),
        }
    }

    #[test]
    fn grouping_buckets_consecutive_days() {
        let points = vec![
            point("2024-01-15T08:00:00Z", "10.00"),
            point("2024-01-15T20:00:00Z", "5.50"),
            point("2024-01-17T09:00:00Z", "2.00"),
        ];

        let buckets = group_by_day(&points);

        assert_eq!(buckets.len(), 2);
        assert_eq!(
            buckets[0],
            DayBucket {
                date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                order_count: 2,
                revenue: Decimal::new(1550, 2),
            }
        );
        assert_eq!(buckets[1].order_count, 1);
    }

    #[test]
    fn grouping_uses_utc_day_boundaries() {
        // 23:30 UTC and 00:30 UTC the next day land in different buckets.
        let points = vec![
            point("2024-01-15T23:30:00Z", "1.00"),
            point("2024-01-16T00:30:00Z", "1.00"),
        ];
        assert_eq!(group_by_day(&points).len(), 2);
    }

    #[test]
    fn empty_window_yields_no_buckets() {
        assert!(group_by_day(&[]).is_empty());
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        let avg = average_order_value(Decimal::new(1000, 2), 3);
        assert_eq!(avg, Decimal::new(333, 2));
        assert_eq!(average_order_value(Decimal::ZERO, 0), Decimal::ZERO);
    }

    #[test]
    fn day_bucket_serializes_iso_date() {
        let bucket = DayBucket {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            order_count: 2,
            revenue: Decimal::new(1550, 2),
        };
        let json = serde_json::to_value(&bucket).unwrap();
        assert_eq!(json["date"], "2024-01-15");
        assert_eq!(json["orderCount"], 2);
    }
}
