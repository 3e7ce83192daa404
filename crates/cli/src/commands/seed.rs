//! Seed the database with a demo tenant and sample data.
//!
//! The demo tenant carries a fake access token, so the sync endpoints and
//! the scheduler refuse to run it against the live Shopify API. Product
//! `total_sales` values are re-derived from the seeded line items rather
//! than written directly, matching what a real sync produces.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use uuid::Uuid;

use shoplens_core::{
    DEMO_ACCESS_TOKEN, NewCustomer, NewLineItem, NewOrder, NewProduct, NewTenant,
};
use shoplens_server::db::{
    self, CustomerRepository, OrderRepository, ProductRepository, RepositoryError,
    TenantRepository,
};

const DEMO_SHOP_DOMAIN: &str = "demo-store.myshopify.com";

/// Errors that can occur during seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Seed the database. Skips if the demo tenant already exists.
///
/// # Errors
///
/// Returns `SeedError` if `DATABASE_URL` is unset or any write fails.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| SeedError::MissingEnvVar("DATABASE_URL"))?;
    let pool = db::create_pool(&SecretString::from(database_url)).await?;

    let tenants = TenantRepository::new(&pool);
    if tenants.find_by_domain(DEMO_SHOP_DOMAIN).await?.is_some() {
        tracing::info!("Demo tenant already exists, skipping");
        return Ok(());
    }

    let tenant = tenants
        .create(&NewTenant {
            shop_domain: DEMO_SHOP_DOMAIN.to_string(),
            access_token: DEMO_ACCESS_TOKEN.to_string(),
            name: "Demo Shopify Store".to_string(),
        })
        .await?;
    tracing::info!(tenant_id = %tenant.id, "Created demo tenant");

    let customers = CustomerRepository::new(&pool);
    let mut customer_ids = Vec::new();
    for (shopify_id, email, first, last, spent, count, created, updated) in [
        ("1001", "john.doe@example.com", "John", "Doe", Decimal::new(125_050, 2), 5, "2024-01-15", "2024-12-01"),
        ("1002", "jane.smith@example.com", "Jane", "Smith", Decimal::new(89_025, 2), 3, "2024-02-20", "2024-11-15"),
        ("1003", "bob.wilson@example.com", "Bob", "Wilson", Decimal::new(210_000, 2), 8, "2024-01-10", "2024-12-03"),
    ] {
        let customer = customers
            .upsert(
                tenant.id,
                &NewCustomer {
                    shopify_id: shopify_id.to_string(),
                    email: Some(email.to_string()),
                    first_name: Some(first.to_string()),
                    last_name: Some(last.to_string()),
                    total_spent: spent,
                    orders_count: count,
                    shopify_created_at: Some(midnight(created)),
                    shopify_updated_at: Some(midnight(updated)),
                },
            )
            .await?;
        customer_ids.push(customer.id);
    }
    tracing::info!(count = customer_ids.len(), "Created demo customers");

    let products = ProductRepository::new(&pool);
    let mut product_ids = Vec::new();
    for (shopify_id, title, handle, description, vendor, product_type, created, updated) in [
        ("2001", "Premium T-Shirt", "premium-t-shirt", "High quality cotton t-shirt", "Demo Brand", "Apparel", "2024-01-01", "2024-12-01"),
        ("2002", "Wireless Headphones", "wireless-headphones", "Noise-cancelling wireless headphones", "Tech Corp", "Electronics", "2024-02-01", "2024-11-15"),
        ("2003", "Leather Wallet", "leather-wallet", "Genuine leather wallet", "Accessories Inc", "Accessories", "2024-03-01", "2024-10-20"),
    ] {
        let product = products
            .upsert(
                tenant.id,
                &NewProduct {
                    shopify_id: shopify_id.to_string(),
                    title: title.to_string(),
                    handle: Some(handle.to_string()),
                    description: Some(description.to_string()),
                    vendor: Some(vendor.to_string()),
                    product_type: Some(product_type.to_string()),
                    status: Some("active".to_string()),
                    shopify_created_at: Some(midnight(created)),
                    shopify_updated_at: Some(midnight(updated)),
                },
            )
            .await?;
        product_ids.push(product.id);
    }
    tracing::info!(count = product_ids.len(), "Created demo products");

    let orders = OrderRepository::new(&pool);
    let demo_orders: [(&str, &str, Uuid, &str, Decimal, Decimal, Decimal, &str, &str, Vec<NewLineItem>); 3] = [
        (
            "3001", "1001", customer_ids[0], "john.doe@example.com",
            Decimal::new(45_050, 2), Decimal::new(40_000, 2), Decimal::new(5_050, 2),
            "2024-11-15", "2024-11-16",
            vec![
                line_item("4001", "Premium T-Shirt", 2, Decimal::new(20_000, 2), Some(product_ids[0])),
                line_item("4002", "Leather Wallet", 1, Decimal::new(20_000, 2), Some(product_ids[2])),
            ],
        ),
        (
            "3002", "1002", customer_ids[1], "jane.smith@example.com",
            Decimal::new(32_025, 2), Decimal::new(29_025, 2), Decimal::new(3_000, 2),
            "2024-11-20", "2024-11-21",
            vec![line_item("4003", "Wireless Headphones", 1, Decimal::new(29_025, 2), Some(product_ids[1]))],
        ),
        (
            "3003", "1003", customer_ids[2], "bob.wilson@example.com",
            Decimal::new(80_000, 2), Decimal::new(75_000, 2), Decimal::new(5_000, 2),
            "2024-12-01", "2024-12-02",
            vec![line_item("4004", "Premium T-Shirt", 4, Decimal::new(75_000, 2), Some(product_ids[0]))],
        ),
    ];

    for (shopify_id, number, customer_id, email, total, subtotal, tax, date, updated, items) in
        demo_orders
    {
        let order = orders
            .upsert(
                tenant.id,
                &NewOrder {
                    shopify_id: shopify_id.to_string(),
                    order_number: number.to_string(),
                    customer_id: Some(customer_id),
                    email: Some(email.to_string()),
                    financial_status: Some("paid".to_string()),
                    fulfillment_status: Some("fulfilled".to_string()),
                    total_price: total,
                    subtotal_price: subtotal,
                    total_tax: tax,
                    currency: "USD".to_string(),
                    order_date: midnight(date),
                    shopify_created_at: Some(midnight(date)),
                    shopify_updated_at: Some(midnight(updated)),
                },
            )
            .await?;
        orders.replace_line_items(order.id, &items).await?;
    }
    tracing::info!(count = 3, "Created demo orders");

    products.recompute_total_sales(tenant.id).await?;

    tracing::info!(tenant_id = %tenant.id, "Database seeded");
    Ok(())
}

fn line_item(
    shopify_id: &str,
    title: &str,
    quantity: i32,
    price: Decimal,
    product_id: Option<Uuid>,
) -> NewLineItem {
    NewLineItem {
        shopify_id: shopify_id.to_string(),
        title: title.to_string(),
        quantity,
        price,
        product_id,
    }
}

/// Parse a seed date literal as midnight UTC.
fn midnight(date: &str) -> DateTime<Utc> {
    date.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
        .expect("valid seed date literal")
}
