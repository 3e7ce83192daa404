//! Insight and reporting handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::insights::{
    DEFAULT_LIMIT, DayBucket, Overview, RecentOrder, TopCustomer,
};
use crate::state::AppState;

/// Build the insights router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tenants/{id}/orders", get(recent_orders))
        .route("/tenants/{id}/insights/overview", get(overview))
        .route("/tenants/{id}/insights/orders-by-date", get(orders_by_date))
        .route("/tenants/{id}/insights/top-customers", get(top_customers))
        .route("/tenants/{id}/insights/revenue-trend", get(revenue_trend))
        .route(
            "/tenants/{id}/insights/order-count-trend",
            get(order_count_trend),
        )
}

/// Date-window query parameters. Both bounds are required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// One day of a revenue trend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    pub date: NaiveDate,
    pub revenue: Decimal,
}

/// One day of an order-count trend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCountPoint {
    pub date: NaiveDate,
    pub order_count: i64,
}

/// Headline numbers for a tenant.
///
/// # Errors
///
/// Returns 500 if a query fails.
pub async fn overview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Overview>, AppError> {
    let overview = state.insights().overview(id).await?;
    Ok(Json(overview))
}

/// Daily order buckets within the requested window.
///
/// # Errors
///
/// Returns 400 when `startDate` or `endDate` is missing or unparseable.
pub async fn orders_by_date(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<DayBucket>>, AppError> {
    let (start, end) = parse_range(&query)?;
    let buckets = state.insights().orders_by_date(id, start, end).await?;
    Ok(Json(buckets))
}

/// Customers ranked by lifetime spend.
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn top_customers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<TopCustomer>>, AppError> {
    let customers = state
        .insights()
        .top_customers(id, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(customers))
}

/// Daily revenue within the requested window.
///
/// # Errors
///
/// Returns 400 when the window parameters are missing or unparseable.
pub async fn revenue_trend(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<RevenuePoint>>, AppError> {
    let (start, end) = parse_range(&query)?;
    let buckets = state.insights().orders_by_date(id, start, end).await?;
    Ok(Json(
        buckets
            .into_iter()
            .map(|b| RevenuePoint {
                date: b.date,
                revenue: b.revenue,
            })
            .collect(),
    ))
}

/// Daily order counts within the requested window.
///
/// # Errors
///
/// Returns 400 when the window parameters are missing or unparseable.
pub async fn order_count_trend(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<OrderCountPoint>>, AppError> {
    let (start, end) = parse_range(&query)?;
    let buckets = state.insights().orders_by_date(id, start, end).await?;
    Ok(Json(
        buckets
            .into_iter()
            .map(|b| OrderCountPoint {
                date: b.date,
                order_count: b.order_count,
            })
            .collect(),
    ))
}

/// Most recent orders with customer and line-item details.
///
/// # Errors
///
/// Returns 500 if a query fails.
pub async fn recent_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<RecentOrder>>, AppError> {
    let orders = state
        .insights()
        .recent_orders(id, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(orders))
}

fn parse_range(query: &RangeQuery) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let start = query
        .start_date
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("startDate is required".to_string()))?;
    let end = query
        .end_date
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("endDate is required".to_string()))?;

    Ok((parse_bound(start, false)?, parse_bound(end, true)?))
}

/// Parse an ISO 8601 date or datetime. Bare dates expand to the start of the
/// day, or to the end of the day for the window's upper bound.
fn parse_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, AppError> {
    if let Ok(dt) = value.parse::<DateTime<Utc>>() {
        return Ok(dt);
    }
    let date = value.parse::<NaiveDate>().map_err(|_| {
        AppError::BadRequest(format!("invalid date: {value}, expected ISO 8601"))
    })?;
    let time = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::BadRequest(format!("invalid date: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_dates_expand_to_day_bounds() {
        let start = parse_bound("2024-01-15", false).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-01-15T00:00:00+00:00");

        let end = parse_bound("2024-01-15", true).unwrap();
        assert_eq!(end.to_rfc3339(), "2024-01-15T23:59:59.999+00:00");
    }

    #[test]
    fn full_timestamps_pass_through() {
        let dt = parse_bound("2024-01-15T10:30:00Z", false).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn garbage_dates_are_rejected() {
        assert!(parse_bound("yesterday", false).is_err());
    }

    #[test]
    fn missing_bounds_are_rejected() {
        let query = RangeQuery {
            start_date: Some("2024-01-01".to_string()),
            end_date: None,
        };
        assert!(parse_range(&query).is_err());
    }
}
