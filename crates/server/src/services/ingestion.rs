//! The ingestion pipeline: fetch, transform, upsert, re-derive.
//!
//! Each entity-type sync fetches the tenant's complete upstream collection,
//! transforms the raw records into local write shapes and upserts them keyed
//! on `(tenant_id, shopify_id)`. Running the same sync twice against the same
//! upstream state writes the same rows; nothing is ever duplicated.
//!
//! A full sync runs all three entity types concurrently and isolates their
//! failures: one entity type failing never aborts the others, and the
//! combined report keeps every settled result.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, instrument};
use uuid::Uuid;

use shoplens_core::{
    Customer, EntityOutcome, NewCustomer, NewLineItem, NewOrder, NewProduct, Order, Product,
    SyncOutcome, SyncReport, Tenant,
};

use crate::db::{
    CustomerRepository, OrderRepository, ProductRepository, RepositoryError, TenantRepository,
};
use crate::shopify::ShopifyError;
use crate::shopify::types::{ShopifyCustomer, ShopifyOrder, ShopifyProduct};

/// Records whose external created timestamp falls within this window at
/// classification time count as "created"; everything else counts as
/// "updated".
const CREATED_WINDOW_SECS: i64 = 60;

/// Errors from a single entity-type sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No tenant with this id exists.
    #[error("tenant {0} not found")]
    TenantNotFound(Uuid),

    /// An upstream record could not be transformed into a local write.
    #[error("invalid upstream record: {0}")]
    Transform(String),

    /// The upstream fetch failed; nothing was written.
    #[error(transparent)]
    Fetch(#[from] ShopifyError),

    /// A local write failed mid-sync.
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Upstream collection source, implemented by the live API client.
#[async_trait]
pub trait ShopApi: Send + Sync {
    async fn fetch_customers(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<Vec<ShopifyCustomer>, ShopifyError>;

    async fn fetch_orders(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<Vec<ShopifyOrder>, ShopifyError>;

    async fn fetch_products(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<Vec<ShopifyProduct>, ShopifyError>;
}

#[async_trait]
impl ShopApi for crate::shopify::ShopifyClient {
    async fn fetch_customers(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<Vec<ShopifyCustomer>, ShopifyError> {
        Self::fetch_customers(self, shop_domain, access_token).await
    }

    async fn fetch_orders(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<Vec<ShopifyOrder>, ShopifyError> {
        Self::fetch_orders(self, shop_domain, access_token).await
    }

    async fn fetch_products(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<Vec<ShopifyProduct>, ShopifyError> {
        Self::fetch_products(self, shop_domain, access_token).await
    }
}

/// Persistence seam for the pipeline, implemented by the `PostgreSQL`
/// repositories.
#[async_trait]
pub trait IngestionStore: Send + Sync {
    async fn find_tenant(&self, id: Uuid) -> Result<Option<Tenant>, RepositoryError>;

    async fn upsert_customer(
        &self,
        tenant_id: Uuid,
        new: &NewCustomer,
    ) -> Result<Customer, RepositoryError>;

    async fn upsert_order(&self, tenant_id: Uuid, new: &NewOrder)
    -> Result<Order, RepositoryError>;

    async fn replace_line_items(
        &self,
        order_id: Uuid,
        items: &[NewLineItem],
    ) -> Result<(), RepositoryError>;

    async fn upsert_product(
        &self,
        tenant_id: Uuid,
        new: &NewProduct,
    ) -> Result<Product, RepositoryError>;

    async fn customer_id_by_shopify_id(
        &self,
        tenant_id: Uuid,
        shopify_id: &str,
    ) -> Result<Option<Uuid>, RepositoryError>;

    async fn product_id_by_shopify_id(
        &self,
        tenant_id: Uuid,
        shopify_id: &str,
    ) -> Result<Option<Uuid>, RepositoryError>;

    async fn recompute_total_sales(&self, tenant_id: Uuid) -> Result<u64, RepositoryError>;
}

#[async_trait]
impl IngestionStore for PgPool {
    async fn find_tenant(&self, id: Uuid) -> Result<Option<Tenant>, RepositoryError> {
        TenantRepository::new(self).find_by_id(id).await
    }

    async fn upsert_customer(
        &self,
        tenant_id: Uuid,
        new: &NewCustomer,
    ) -> Result<Customer, RepositoryError> {
        CustomerRepository::new(self).upsert(tenant_id, new).await
    }

    async fn upsert_order(
        &self,
        tenant_id: Uuid,
        new: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        OrderRepository::new(self).upsert(tenant_id, new).await
    }

    async fn replace_line_items(
        &self,
        order_id: Uuid,
        items: &[NewLineItem],
    ) -> Result<(), RepositoryError> {
        OrderRepository::new(self)
            .replace_line_items(order_id, items)
            .await
    }

    async fn upsert_product(
        &self,
        tenant_id: Uuid,
        new: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        ProductRepository::new(self).upsert(tenant_id, new).await
    }

    async fn customer_id_by_shopify_id(
        &self,
        tenant_id: Uuid,
        shopify_id: &str,
    ) -> Result<Option<Uuid>, RepositoryError> {
        CustomerRepository::new(self)
            .find_id_by_shopify_id(tenant_id, shopify_id)
            .await
    }

    async fn product_id_by_shopify_id(
        &self,
        tenant_id: Uuid,
        shopify_id: &str,
    ) -> Result<Option<Uuid>, RepositoryError> {
        ProductRepository::new(self)
            .find_id_by_shopify_id(tenant_id, shopify_id)
            .await
    }

    async fn recompute_total_sales(&self, tenant_id: Uuid) -> Result<u64, RepositoryError> {
        ProductRepository::new(self)
            .recompute_total_sales(tenant_id)
            .await
    }
}

/// Orchestrates entity-type syncs for tenants.
#[derive(Clone)]
pub struct IngestionService {
    api: Arc<dyn ShopApi>,
    store: Arc<dyn IngestionStore>,
}

impl IngestionService {
    #[must_use]
    pub fn new(api: Arc<dyn ShopApi>, store: Arc<dyn IngestionStore>) -> Self {
        Self { api, store }
    }

    /// Sync all customers for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the tenant is unknown, the fetch fails or a
    /// write fails; records upserted before a mid-sync failure remain.
    #[instrument(skip(self))]
    pub async fn sync_customers(&self, tenant_id: Uuid) -> Result<SyncOutcome, SyncError> {
        let tenant = self.load_tenant(tenant_id).await?;
        let raw = self
            .api
            .fetch_customers(&tenant.shop_domain, &tenant.access_token)
            .await?;

        let total = raw.len();
        let mut created = 0;
        for record in &raw {
            self.store
                .upsert_customer(tenant_id, &transform_customer(record))
                .await?;
            if is_recently_created(record.created_at, Utc::now()) {
                created += 1;
            }
        }

        info!(total, created, "Customer sync complete");
        Ok(SyncOutcome::new(total, created, total - created))
    }

    /// Sync all orders for a tenant, replacing each order's line items.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the tenant is unknown, the fetch fails, a
    /// record cannot be transformed or a write fails.
    #[instrument(skip(self))]
    pub async fn sync_orders(&self, tenant_id: Uuid) -> Result<SyncOutcome, SyncError> {
        let tenant = self.load_tenant(tenant_id).await?;
        let raw = self
            .api
            .fetch_orders(&tenant.shop_domain, &tenant.access_token)
            .await?;

        let total = raw.len();
        let mut created = 0;
        for record in &raw {
            let customer_id = match &record.customer {
                Some(c) => {
                    self.store
                        .customer_id_by_shopify_id(tenant_id, &c.id.to_string())
                        .await?
                }
                None => None,
            };

            let order = self
                .store
                .upsert_order(tenant_id, &transform_order(record, customer_id)?)
                .await?;
            if is_recently_created(record.created_at, Utc::now()) {
                created += 1;
            }

            let mut items = Vec::with_capacity(record.line_items.len());
            for item in &record.line_items {
                let product_id = match item.product_id {
                    Some(pid) => {
                        self.store
                            .product_id_by_shopify_id(tenant_id, &pid.to_string())
                            .await?
                    }
                    None => None,
                };
                items.push(NewLineItem {
                    shopify_id: item.id.to_string(),
                    title: item.title.clone(),
                    quantity: i32::try_from(item.quantity).unwrap_or(i32::MAX),
                    price: item.price,
                    product_id,
                });
            }
            self.store.replace_line_items(order.id, &items).await?;
        }

        info!(total, created, "Order sync complete");
        Ok(SyncOutcome::new(total, created, total - created))
    }

    /// Sync all products for a tenant, then recompute every product's
    /// `total_sales` from the line items on record.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the tenant is unknown, the fetch fails or a
    /// write fails.
    #[instrument(skip(self))]
    pub async fn sync_products(&self, tenant_id: Uuid) -> Result<SyncOutcome, SyncError> {
        let tenant = self.load_tenant(tenant_id).await?;
        let raw = self
            .api
            .fetch_products(&tenant.shop_domain, &tenant.access_token)
            .await?;

        let total = raw.len();
        let mut created = 0;
        for record in &raw {
            self.store
                .upsert_product(tenant_id, &transform_product(record))
                .await?;
            if is_recently_created(record.created_at, Utc::now()) {
                created += 1;
            }
        }

        let recomputed = self.store.recompute_total_sales(tenant_id).await?;

        info!(total, created, recomputed, "Product sync complete");
        Ok(SyncOutcome::new(total, created, total - created))
    }

    /// Run all three entity-type syncs concurrently.
    ///
    /// Failures are isolated per entity type; the report's overall `success`
    /// is true only when all three succeeded.
    #[instrument(skip(self))]
    pub async fn sync_all(&self, tenant_id: Uuid) -> SyncReport {
        let (customers, orders, products) = tokio::join!(
            self.sync_customers(tenant_id),
            self.sync_orders(tenant_id),
            self.sync_products(tenant_id),
        );

        SyncReport::new(
            settle(customers, "customers", tenant_id),
            settle(orders, "orders", tenant_id),
            settle(products, "products", tenant_id),
        )
    }

    async fn load_tenant(&self, tenant_id: Uuid) -> Result<Tenant, SyncError> {
        self.store
            .find_tenant(tenant_id)
            .await?
            .ok_or(SyncError::TenantNotFound(tenant_id))
    }
}

fn settle(result: Result<SyncOutcome, SyncError>, entity: &str, tenant_id: Uuid) -> EntityOutcome {
    match result {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            error!(%tenant_id, entity, error = %e, "Entity sync failed");
            EntityOutcome::failed(e.to_string())
        }
    }
}

/// Whether a record's external created timestamp counts as newly created when
/// classified at `now`. Records without one count as updated.
fn is_recently_created(external_created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    external_created_at.is_some_and(|created_at| {
        now.signed_duration_since(created_at) < Duration::seconds(CREATED_WINDOW_SECS)
    })
}

/// Treat empty and whitespace-only strings as absent.
fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn transform_customer(raw: &ShopifyCustomer) -> NewCustomer {
    NewCustomer {
        shopify_id: raw.id.to_string(),
        email: non_empty(raw.email.as_deref()),
        first_name: non_empty(raw.first_name.as_deref()),
        last_name: non_empty(raw.last_name.as_deref()),
        total_spent: raw.total_spent,
        orders_count: i32::try_from(raw.orders_count).unwrap_or(i32::MAX),
        shopify_created_at: raw.created_at,
        shopify_updated_at: raw.updated_at,
    }
}

fn transform_order(raw: &ShopifyOrder, customer_id: Option<Uuid>) -> Result<NewOrder, SyncError> {
    let order_date = raw.created_at.ok_or_else(|| {
        SyncError::Transform(format!("order {} is missing created_at", raw.id))
    })?;

    let order_number = raw
        .order_number
        .or(raw.number)
        .map_or_else(|| raw.id.to_string(), |n| n.to_string());

    Ok(NewOrder {
        shopify_id: raw.id.to_string(),
        order_number,
        customer_id,
        email: non_empty(raw.email.as_deref()),
        financial_status: non_empty(raw.financial_status.as_deref()),
        fulfillment_status: non_empty(raw.fulfillment_status.as_deref()),
        total_price: raw.total_price,
        subtotal_price: raw.subtotal_price,
        total_tax: raw.total_tax,
        currency: raw.currency.clone().unwrap_or_else(|| "USD".to_string()),
        order_date,
        shopify_created_at: raw.created_at,
        shopify_updated_at: raw.updated_at,
    })
}

fn transform_product(raw: &ShopifyProduct) -> NewProduct {
    NewProduct {
        shopify_id: raw.id.to_string(),
        title: raw.title.clone(),
        handle: non_empty(raw.handle.as_deref()),
        description: non_empty(raw.body_html.as_deref()),
        vendor: non_empty(raw.vendor.as_deref()),
        product_type: non_empty(raw.product_type.as_deref()),
        status: non_empty(raw.status.as_deref()),
        shopify_created_at: raw.created_at,
        shopify_updated_at: raw.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rust_decimal::Decimal;
    use shoplens_core::OrderLineItem;

    use super::*;

    struct StubApi {
        customers: Result<Vec<ShopifyCustomer>, String>,
        orders: Result<Vec<ShopifyOrder>, String>,
        products: Result<Vec<ShopifyProduct>, String>,
    }

    impl Default for StubApi {
        fn default() -> Self {
            Self {
                customers: Ok(Vec::new()),
                orders: Ok(Vec::new()),
                products: Ok(Vec::new()),
            }
        }
    }

    fn stub_err(message: &str) -> ShopifyError {
        ShopifyError::Status {
            status: 500,
            message: message.to_string(),
        }
    }

    #[async_trait]
    impl ShopApi for StubApi {
        async fn fetch_customers(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Vec<ShopifyCustomer>, ShopifyError> {
            self.customers.clone().map_err(|m| stub_err(&m))
        }

        async fn fetch_orders(&self, _: &str, _: &str) -> Result<Vec<ShopifyOrder>, ShopifyError> {
            self.orders.clone().map_err(|m| stub_err(&m))
        }

        async fn fetch_products(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Vec<ShopifyProduct>, ShopifyError> {
            self.products.clone().map_err(|m| stub_err(&m))
        }
    }

    #[derive(Default)]
    struct MemStore {
        tenants: Mutex<Vec<Tenant>>,
        customers: Mutex<Vec<Customer>>,
        orders: Mutex<Vec<Order>>,
        line_items: Mutex<Vec<OrderLineItem>>,
        products: Mutex<Vec<Product>>,
    }

    impl MemStore {
        fn with_tenant(tenant_id: Uuid) -> Self {
            let store = Self::default();
            store.tenants.lock().unwrap().push(Tenant {
                id: tenant_id,
                shop_domain: "demo.myshopify.com".to_string(),
                access_token: "shpat_test".to_string(),
                name: "Demo".to_string(),
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
            store
        }
    }

    #[async_trait]
    impl IngestionStore for MemStore {
        async fn find_tenant(&self, id: Uuid) -> Result<Option<Tenant>, RepositoryError> {
            Ok(self
                .tenants
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.id == id)
                .cloned())
        }

        async fn upsert_customer(
            &self,
            tenant_id: Uuid,
            new: &NewCustomer,
        ) -> Result<Customer, RepositoryError> {
            let mut customers = self.customers.lock().unwrap();
            if let Some(existing) = customers
                .iter_mut()
                .find(|c| c.tenant_id == tenant_id && c.shopify_id == new.shopify_id)
            {
                existing.email.clone_from(&new.email);
                existing.first_name.clone_from(&new.first_name);
                existing.last_name.clone_from(&new.last_name);
                existing.total_spent = new.total_spent;
                existing.orders_count = new.orders_count;
                existing.updated_at = Utc::now();
                return Ok(existing.clone());
            }

            let customer = Customer {
                id: Uuid::new_v4(),
                tenant_id,
                shopify_id: new.shopify_id.clone(),
                email: new.email.clone(),
                first_name: new.first_name.clone(),
                last_name: new.last_name.clone(),
                total_spent: new.total_spent,
                orders_count: new.orders_count,
                shopify_created_at: new.shopify_created_at,
                shopify_updated_at: new.shopify_updated_at,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            customers.push(customer.clone());
            Ok(customer)
        }

        async fn upsert_order(
            &self,
            tenant_id: Uuid,
            new: &NewOrder,
        ) -> Result<Order, RepositoryError> {
            let mut orders = self.orders.lock().unwrap();
            if let Some(existing) = orders
                .iter_mut()
                .find(|o| o.tenant_id == tenant_id && o.shopify_id == new.shopify_id)
            {
                existing.customer_id = new.customer_id;
                existing.total_price = new.total_price;
                existing.updated_at = Utc::now();
                return Ok(existing.clone());
            }

            let order = Order {
                id: Uuid::new_v4(),
                tenant_id,
                shopify_id: new.shopify_id.clone(),
                order_number: new.order_number.clone(),
                customer_id: new.customer_id,
                email: new.email.clone(),
                financial_status: new.financial_status.clone(),
                fulfillment_status: new.fulfillment_status.clone(),
                total_price: new.total_price,
                subtotal_price: new.subtotal_price,
                total_tax: new.total_tax,
                currency: new.currency.clone(),
                order_date: new.order_date,
                shopify_created_at: new.shopify_created_at,
                shopify_updated_at: new.shopify_updated_at,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            orders.push(order.clone());
            Ok(order)
        }

        async fn replace_line_items(
            &self,
            order_id: Uuid,
            items: &[NewLineItem],
        ) -> Result<(), RepositoryError> {
            let mut line_items = self.line_items.lock().unwrap();
            line_items.retain(|li| li.order_id != order_id);
            for item in items {
                line_items.push(OrderLineItem {
                    id: Uuid::new_v4(),
                    order_id,
                    shopify_id: item.shopify_id.clone(),
                    title: item.title.clone(),
                    quantity: item.quantity,
                    price: item.price,
                    product_id: item.product_id,
                    created_at: Utc::now(),
                });
            }
            Ok(())
        }

        async fn upsert_product(
            &self,
            tenant_id: Uuid,
            new: &NewProduct,
        ) -> Result<Product, RepositoryError> {
            let mut products = self.products.lock().unwrap();
            if let Some(existing) = products
                .iter_mut()
                .find(|p| p.tenant_id == tenant_id && p.shopify_id == new.shopify_id)
            {
                existing.title.clone_from(&new.title);
                existing.updated_at = Utc::now();
                return Ok(existing.clone());
            }

            let product = Product {
                id: Uuid::new_v4(),
                tenant_id,
                shopify_id: new.shopify_id.clone(),
                title: new.title.clone(),
                handle: new.handle.clone(),
                description: new.description.clone(),
                vendor: new.vendor.clone(),
                product_type: new.product_type.clone(),
                status: new.status.clone(),
                total_sales: Decimal::ZERO,
                shopify_created_at: new.shopify_created_at,
                shopify_updated_at: new.shopify_updated_at,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            products.push(product.clone());
            Ok(product)
        }

        async fn customer_id_by_shopify_id(
            &self,
            tenant_id: Uuid,
            shopify_id: &str,
        ) -> Result<Option<Uuid>, RepositoryError> {
            Ok(self
                .customers
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.tenant_id == tenant_id && c.shopify_id == shopify_id)
                .map(|c| c.id))
        }

        async fn product_id_by_shopify_id(
            &self,
            tenant_id: Uuid,
            shopify_id: &str,
        ) -> Result<Option<Uuid>, RepositoryError> {
            Ok(self
                .products
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.tenant_id == tenant_id && p.shopify_id == shopify_id)
                .map(|p| p.id))
        }

        async fn recompute_total_sales(&self, tenant_id: Uuid) -> Result<u64, RepositoryError> {
            let line_items = self.line_items.lock().unwrap().clone();
            let mut products = self.products.lock().unwrap();
            let mut updated = 0;
            for product in products.iter_mut().filter(|p| p.tenant_id == tenant_id) {
                product.total_sales = line_items
                    .iter()
                    .filter(|li| li.product_id == Some(product.id))
                    .map(|li| li.price)
                    .sum();
                updated += 1;
            }
            Ok(updated)
        }
    }

    fn service(api: StubApi, store: Arc<MemStore>) -> IngestionService {
        IngestionService::new(Arc::new(api), store)
    }

    fn raw_customer(id: i64, email: &str) -> ShopifyCustomer {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "email": email,
            "total_spent": "100.00",
            "orders_count": 2,
        }))
        .unwrap()
    }

    fn raw_order(id: i64, items: serde_json::Value) -> ShopifyOrder {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "order_number": 1001,
            "total_price": "25.50",
            "created_at": "2024-01-15T10:00:00Z",
            "line_items": items,
        }))
        .unwrap()
    }

    fn raw_product(id: i64, title: &str) -> ShopifyProduct {
        serde_json::from_value(serde_json::json!({"id": id, "title": title})).unwrap()
    }

    #[tokio::test]
    async fn customer_sync_is_idempotent() {
        let tenant_id = Uuid::new_v4();
        let store = Arc::new(MemStore::with_tenant(tenant_id));
        let api = StubApi {
            customers: Ok(vec![raw_customer(1, "a@x.com"), raw_customer(2, "b@x.com")]),
            ..StubApi::default()
        };
        let svc = service(api, Arc::clone(&store));

        svc.sync_customers(tenant_id).await.unwrap();
        let outcome = svc.sync_customers(tenant_id).await.unwrap();

        assert_eq!(outcome.total, 2);
        assert_eq!(store.customers.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn customer_resync_overwrites_fields() {
        let tenant_id = Uuid::new_v4();
        let store = Arc::new(MemStore::with_tenant(tenant_id));
        let svc = service(
            StubApi {
                customers: Ok(vec![raw_customer(1, "old@x.com")]),
                ..StubApi::default()
            },
            Arc::clone(&store),
        );
        svc.sync_customers(tenant_id).await.unwrap();

        let svc = service(
            StubApi {
                customers: Ok(vec![raw_customer(1, "new@x.com")]),
                ..StubApi::default()
            },
            Arc::clone(&store),
        );
        svc.sync_customers(tenant_id).await.unwrap();

        let customers = store.customers.lock().unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].email.as_deref(), Some("new@x.com"));
    }

    #[tokio::test]
    async fn order_sync_replaces_line_items() {
        let tenant_id = Uuid::new_v4();
        let store = Arc::new(MemStore::with_tenant(tenant_id));
        let items_v1 = serde_json::json!([
            {"id": 11, "title": "Widget", "quantity": 1, "price": "10.00"},
            {"id": 12, "title": "Gadget", "quantity": 2, "price": "15.50"},
        ]);
        let svc = service(
            StubApi {
                orders: Ok(vec![raw_order(500, items_v1)]),
                ..StubApi::default()
            },
            Arc::clone(&store),
        );
        svc.sync_orders(tenant_id).await.unwrap();
        assert_eq!(store.line_items.lock().unwrap().len(), 2);

        let items_v2 = serde_json::json!([
            {"id": 13, "title": "Doohickey", "quantity": 1, "price": "5.00"},
        ]);
        let svc = service(
            StubApi {
                orders: Ok(vec![raw_order(500, items_v2)]),
                ..StubApi::default()
            },
            Arc::clone(&store),
        );
        svc.sync_orders(tenant_id).await.unwrap();

        let line_items = store.line_items.lock().unwrap();
        assert_eq!(line_items.len(), 1);
        assert_eq!(line_items[0].title, "Doohickey");
        assert_eq!(store.orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_customer_reference_stays_null() {
        let tenant_id = Uuid::new_v4();
        let store = Arc::new(MemStore::with_tenant(tenant_id));
        let order: ShopifyOrder = serde_json::from_value(serde_json::json!({
            "id": 600,
            "customer": {"id": 999},
            "total_price": "9.99",
            "created_at": "2024-01-15T10:00:00Z",
        }))
        .unwrap();
        let svc = service(
            StubApi {
                orders: Ok(vec![order]),
                ..StubApi::default()
            },
            Arc::clone(&store),
        );

        svc.sync_orders(tenant_id).await.unwrap();

        assert!(store.orders.lock().unwrap()[0].customer_id.is_none());
    }

    #[tokio::test]
    async fn product_sync_rederives_total_sales() {
        let tenant_id = Uuid::new_v4();
        let store = Arc::new(MemStore::with_tenant(tenant_id));

        let svc = service(
            StubApi {
                products: Ok(vec![raw_product(42, "Widget")]),
                ..StubApi::default()
            },
            Arc::clone(&store),
        );
        svc.sync_products(tenant_id).await.unwrap();

        let items = serde_json::json!([
            {"id": 11, "product_id": 42, "title": "Widget", "quantity": 1, "price": "10.00"},
            {"id": 12, "product_id": 42, "title": "Widget", "quantity": 1, "price": "15.50"},
        ]);
        let svc = service(
            StubApi {
                orders: Ok(vec![raw_order(500, items)]),
                ..StubApi::default()
            },
            Arc::clone(&store),
        );
        svc.sync_orders(tenant_id).await.unwrap();

        let svc = service(
            StubApi {
                products: Ok(vec![raw_product(42, "Widget")]),
                ..StubApi::default()
            },
            Arc::clone(&store),
        );
        svc.sync_products(tenant_id).await.unwrap();

        let products = store.products.lock().unwrap();
        assert_eq!(products[0].total_sales, Decimal::new(2550, 2));
    }

    #[tokio::test]
    async fn sync_all_isolates_entity_failures() {
        let tenant_id = Uuid::new_v4();
        let store = Arc::new(MemStore::with_tenant(tenant_id));
        let svc = service(
            StubApi {
                customers: Ok(vec![raw_customer(1, "a@x.com")]),
                orders: Err("rate limited".to_string()),
                products: Ok(vec![raw_product(42, "Widget")]),
            },
            Arc::clone(&store),
        );

        let report = svc.sync_all(tenant_id).await;

        assert!(!report.success);
        assert!(report.customers.is_ok());
        assert!(!report.orders.is_ok());
        assert!(report.products.is_ok());
        assert_eq!(store.customers.lock().unwrap().len(), 1);
        assert_eq!(store.products.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sync_fails_for_unknown_tenant() {
        let store = Arc::new(MemStore::default());
        let svc = service(StubApi::default(), store);

        let err = svc.sync_customers(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, SyncError::TenantNotFound(_)));
    }

    #[test]
    fn order_without_created_at_is_rejected() {
        let order: ShopifyOrder = serde_json::from_value(serde_json::json!({"id": 7})).unwrap();
        let err = transform_order(&order, None).unwrap_err();
        assert!(matches!(err, SyncError::Transform(_)));
    }

    #[test]
    fn order_number_falls_back_to_legacy_then_id() {
        let order: ShopifyOrder = serde_json::from_value(serde_json::json!({
            "id": 7, "number": 88, "created_at": "2024-01-15T10:00:00Z",
        }))
        .unwrap();
        assert_eq!(transform_order(&order, None).unwrap().order_number, "88");

        let order: ShopifyOrder = serde_json::from_value(serde_json::json!({
            "id": 7, "created_at": "2024-01-15T10:00:00Z",
        }))
        .unwrap();
        assert_eq!(transform_order(&order, None).unwrap().order_number, "7");
    }

    #[test]
    fn created_classification_uses_sixty_second_window() {
        let now = Utc::now();
        assert!(is_recently_created(Some(now - Duration::seconds(30)), now));
        assert!(!is_recently_created(Some(now - Duration::seconds(120)), now));
        assert!(!is_recently_created(Some(now - Duration::seconds(60)), now));
        assert!(!is_recently_created(None, now));
    }

    #[tokio::test]
    async fn classification_follows_the_upstream_created_timestamp() {
        let tenant_id = Uuid::new_v4();
        let store = Arc::new(MemStore::with_tenant(tenant_id));

        fn customer_created_at(id: i64, created_at: &str) -> ShopifyCustomer {
            serde_json::from_value(serde_json::json!({
                "id": id,
                "email": "a@x.com",
                "created_at": created_at,
            }))
            .unwrap()
        }

        // An old upstream record is "updated" even on its very first sync;
        // only upstream records created moments ago count as "created".
        let aged = (Utc::now() - Duration::seconds(120)).to_rfc3339();
        let fresh = Utc::now().to_rfc3339();
        let svc = service(
            StubApi {
                customers: Ok(vec![
                    customer_created_at(1, &aged),
                    customer_created_at(2, &fresh),
                ]),
                ..StubApi::default()
            },
            Arc::clone(&store),
        );

        let outcome = svc.sync_customers(tenant_id).await.unwrap();

        assert_eq!(outcome.total, 2);
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.updated, 1);
    }

    #[test]
    fn empty_strings_become_absent() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(" a@x.com ")), Some("a@x.com".to_string()));
    }
}
