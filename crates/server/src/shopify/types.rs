//! Raw record types returned by the Shopify REST Admin API.
//!
//! Deserialization is deliberately lenient: Shopify sends money as string
//! decimals, omits optional fields entirely, and nulls others. Absent or
//! null numeric fields coerce to zero; absent text stays `None`; timestamps
//! are RFC 3339 with offsets, converted to UTC.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// One page of a collection endpoint (`/customers.json`, `/orders.json`,
/// `/products.json`). The collection key differs per endpoint.
pub trait CollectionPage {
    type Item;

    fn into_items(self) -> Vec<Self::Item>;
}

/// A customer record from `/customers.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyCustomer {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "de_money")]
    pub total_spent: Decimal,
    #[serde(default)]
    pub orders_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomersPage {
    pub customers: Vec<ShopifyCustomer>,
}

impl CollectionPage for CustomersPage {
    type Item = ShopifyCustomer;

    fn into_items(self) -> Vec<ShopifyCustomer> {
        self.customers
    }
}

/// The nested customer reference embedded in an order. Only the id is used;
/// order sync never creates customers as a side effect.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyCustomerRef {
    pub id: i64,
}

/// An order record from `/orders.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyOrder {
    pub id: i64,
    #[serde(default)]
    pub order_number: Option<i64>,
    /// Legacy field; some API versions send `number` instead.
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub customer: Option<ShopifyCustomerRef>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default)]
    pub fulfillment_status: Option<String>,
    #[serde(default, deserialize_with = "de_money")]
    pub total_price: Decimal,
    #[serde(default, deserialize_with = "de_money")]
    pub subtotal_price: Decimal,
    #[serde(default, deserialize_with = "de_money")]
    pub total_tax: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub line_items: Vec<ShopifyLineItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersPage {
    pub orders: Vec<ShopifyOrder>,
}

impl CollectionPage for OrdersPage {
    type Item = ShopifyOrder;

    fn into_items(self) -> Vec<ShopifyOrder> {
        self.orders
    }
}

/// A line item embedded in an order.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyLineItem {
    pub id: i64,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, deserialize_with = "de_money")]
    pub price: Decimal,
}

/// A product record from `/products.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyProduct {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductsPage {
    pub products: Vec<ShopifyProduct>,
}

impl CollectionPage for ProductsPage {
    type Item = ShopifyProduct;

    fn into_items(self) -> Vec<ShopifyProduct> {
        self.products
    }
}

/// Envelope returned by `/shop.json`, used by the connection test.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopEnvelope {
    pub shop: ShopInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub myshopify_domain: Option<String>,
}

/// Deserialize a Shopify money field.
///
/// Accepts a string decimal ("10.00"), a bare number, or null; null and the
/// empty string coerce to zero.
fn de_money<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawMoney {
        Text(String),
        Number(f64),
    }

    match Option::<RawMoney>::deserialize(deserializer)? {
        None => Ok(Decimal::ZERO),
        Some(RawMoney::Text(s)) if s.trim().is_empty() => Ok(Decimal::ZERO),
        Some(RawMoney::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
        Some(RawMoney::Number(n)) => Decimal::try_from(n).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_money_accepts_string_decimals() {
        let raw = r#"{"id": 1001, "email": "a@x.com", "total_spent": "199.50", "orders_count": 3}"#;
        let customer: ShopifyCustomer = serde_json::from_str(raw).unwrap();
        assert_eq!(customer.total_spent, Decimal::new(19950, 2));
        assert_eq!(customer.orders_count, 3);
    }

    #[test]
    fn absent_numeric_fields_default_to_zero() {
        let customer: ShopifyCustomer = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(customer.total_spent, Decimal::ZERO);
        assert_eq!(customer.orders_count, 0);
        assert!(customer.email.is_none());
        assert!(customer.created_at.is_none());
    }

    #[test]
    fn null_money_coerces_to_zero() {
        let raw = r#"{"id": 1, "total_price": null, "subtotal_price": "", "total_tax": 1.5}"#;
        let order: ShopifyOrder = serde_json::from_str(raw).unwrap();
        assert_eq!(order.total_price, Decimal::ZERO);
        assert_eq!(order.subtotal_price, Decimal::ZERO);
        assert_eq!(order.total_tax, Decimal::new(15, 1));
    }

    #[test]
    fn order_timestamps_convert_offsets_to_utc() {
        let raw = r#"{"id": 9, "created_at": "2024-01-15T10:00:00-05:00"}"#;
        let order: ShopifyOrder = serde_json::from_str(raw).unwrap();
        let created = order.created_at.unwrap();
        assert_eq!(created.to_rfc3339(), "2024-01-15T15:00:00+00:00");
    }

    #[test]
    fn order_line_items_default_to_empty() {
        let order: ShopifyOrder = serde_json::from_str(r#"{"id": 2}"#).unwrap();
        assert!(order.line_items.is_empty());
        assert!(order.customer.is_none());
    }

    #[test]
    fn line_item_without_product_reference() {
        let raw = r#"{"id": 77, "title": "Gift wrap", "quantity": 1, "price": "4.00"}"#;
        let item: ShopifyLineItem = serde_json::from_str(raw).unwrap();
        assert!(item.product_id.is_none());
        assert_eq!(item.price, Decimal::new(400, 2));
    }
}
