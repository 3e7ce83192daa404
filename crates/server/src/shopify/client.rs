//! HTTP client for the Shopify REST Admin API.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::types::{
    CollectionPage, CustomersPage, OrdersPage, ProductsPage, ShopEnvelope, ShopInfo,
    ShopifyCustomer, ShopifyOrder, ShopifyProduct,
};
use super::{ConnectionCheck, ShopifyError};

/// Maximum page size accepted by the Admin API.
pub const DEFAULT_PAGE_SIZE: u32 = 250;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Client for the Shopify REST Admin API.
///
/// One instance serves all tenants: the shop domain and access token are
/// passed per call. Collection fetches walk cursor pagination to exhaustion
/// and return the complete collection in upstream order.
#[derive(Clone)]
pub struct ShopifyClient {
    client: reqwest::Client,
    api_version: String,
    page_size: u32,
    /// Overrides the per-shop base URL. Used to point the client at a local
    /// mock server in tests.
    base_override: Option<Url>,
}

impl ShopifyClient {
    /// Create a client for the given API version with a per-request timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(api_version: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_version: api_version.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            base_override: None,
        }
    }

    /// Create a client whose requests go to `base` instead of
    /// `https://{shop_domain}/admin/api/{version}`. For tests.
    #[must_use]
    pub fn with_base_url(base: Url) -> Self {
        let mut client = Self::new("2024-01", Duration::from_secs(30));
        client.base_override = Some(base);
        client
    }

    /// Override the pagination page size (default 250).
    #[must_use]
    pub const fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    fn resource_url(&self, shop_domain: &str, resource: &str) -> Result<Url, ShopifyError> {
        let base = self.base_override.as_ref().map_or_else(
            || format!("https://{shop_domain}/admin/api/{}/", self.api_version),
            |base| base.as_str().trim_end_matches('/').to_string() + "/",
        );
        let url = format!("{base}{resource}");
        Url::parse(&url).map_err(|e| ShopifyError::Status {
            status: 0,
            message: format!("invalid request URL {url}: {e}"),
        })
    }

    /// Fetch the complete customer collection for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError`] on any HTTP, status or decode failure; no
    /// partial collection is ever returned.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_customers(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<Vec<ShopifyCustomer>, ShopifyError> {
        self.fetch_collection::<CustomersPage>(shop_domain, access_token, "customers.json", &[])
            .await
    }

    /// Fetch the complete order collection for a tenant, all statuses.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError`] on any HTTP, status or decode failure.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_orders(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<Vec<ShopifyOrder>, ShopifyError> {
        self.fetch_collection::<OrdersPage>(
            shop_domain,
            access_token,
            "orders.json",
            &[("status", "any")],
        )
        .await
    }

    /// Fetch the complete product collection for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError`] on any HTTP, status or decode failure.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_products(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<Vec<ShopifyProduct>, ShopifyError> {
        self.fetch_collection::<ProductsPage>(shop_domain, access_token, "products.json", &[])
            .await
    }

    /// Single lightweight authenticated request against `/shop.json`.
    ///
    /// Never paginates. Reports success or a structured failure reason
    /// (credential rejected with status, unreachable host, other).
    #[instrument(skip(self, access_token))]
    pub async fn test_connection(&self, shop_domain: &str, access_token: &str) -> ConnectionCheck {
        match self.fetch_shop(shop_domain, access_token).await {
            Ok(shop) => {
                debug!(shop = %shop.name, "Connection test succeeded");
                ConnectionCheck::ok()
            }
            Err(ShopifyError::Status { status, message }) => {
                ConnectionCheck::failed(message, Some(status))
            }
            Err(ShopifyError::Http(e)) if e.is_connect() || e.is_timeout() => {
                ConnectionCheck::failed(
                    "Could not reach Shopify store. Check if the shop domain is correct.",
                    None,
                )
            }
            Err(e) => ConnectionCheck::failed(e.to_string(), None),
        }
    }

    async fn fetch_shop(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<ShopInfo, ShopifyError> {
        let url = self.resource_url(shop_domain, "shop.json")?;
        let envelope: ShopEnvelope = self.get_json(url, access_token, &[]).await?;
        Ok(envelope.shop)
    }

    /// Walk cursor pagination for one collection endpoint.
    ///
    /// Each response may carry a `page_info` cursor in a `Link` header entry
    /// with `rel="next"`; the loop issues follow-up requests until the cursor
    /// is absent and accumulates every page in memory.
    async fn fetch_collection<P>(
        &self,
        shop_domain: &str,
        access_token: &str,
        resource: &str,
        extra_params: &[(&str, &str)],
    ) -> Result<Vec<P::Item>, ShopifyError>
    where
        P: CollectionPage + DeserializeOwned,
    {
        let url = self.resource_url(shop_domain, resource)?;
        let limit = self.page_size.to_string();
        let mut items = Vec::new();
        let mut page_info: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut params: Vec<(&str, &str)> = vec![("limit", &limit)];
            params.extend_from_slice(extra_params);
            if let Some(cursor) = &page_info {
                params.push(("page_info", cursor));
            }

            let (page, next) = self
                .get_page::<P>(url.clone(), access_token, &params)
                .await?;
            items.extend(page.into_items());
            pages += 1;

            match next {
                Some(cursor) => page_info = Some(cursor),
                None => break,
            }
        }

        debug!(resource, pages, total = items.len(), "Collection fetched");
        Ok(items)
    }

    async fn get_page<P>(
        &self,
        url: Url,
        access_token: &str,
        params: &[(&str, &str)],
    ) -> Result<(P, Option<String>), ShopifyError>
    where
        P: DeserializeOwned,
    {
        let response = self
            .client
            .get(url)
            .header(ACCESS_TOKEN_HEADER, access_token)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let next = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_info);

        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let page: P = serde_json::from_str(&body)?;
        Ok((page, next))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        access_token: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ShopifyError> {
        let (value, _next) = self.get_page::<T>(url, access_token, params).await?;
        Ok(value)
    }
}

/// Build a [`ShopifyError::Status`], preferring the API's own error text.
///
/// Shopify error bodies look like `{"errors": "..."}` or
/// `{"errors": {"field": ["..."]}}`.
fn status_error(status: StatusCode, body: &str) -> ShopifyError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("errors").map(|errors| match errors {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Shopify API error")
                .to_string()
        });

    ShopifyError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Extract the `page_info` cursor from a `Link` header's `rel="next"` entry.
///
/// The header holds comma-separated entries of the form
/// `<https://...?page_info=abc&limit=250>; rel="next"`.
fn next_page_info(link_header: &str) -> Option<String> {
    link_header.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        if !params.contains("rel=\"next\"") {
            return None;
        }
        let target = target.trim().trim_start_matches('<').trim_end_matches('>');
        let url = Url::parse(target).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page_info")
            .map(|(_, value)| value.into_owned())
    })
}
