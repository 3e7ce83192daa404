//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::{IngestionService, InsightsService};
use crate::shopify::ShopifyClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    shopify_client: ShopifyClient,
    ingestion: IngestionService,
    insights: InsightsService,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool, shopify_client: ShopifyClient) -> Self {
        let ingestion = IngestionService::new(
            Arc::new(shopify_client.clone()),
            Arc::new(pool.clone()),
        );
        let insights = InsightsService::new(pool.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shopify_client,
                ingestion,
                insights,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify_client
    }

    #[must_use]
    pub fn ingestion(&self) -> &IngestionService {
        &self.inner.ingestion
    }

    #[must_use]
    pub fn insights(&self) -> &InsightsService {
        &self.inner.insights
    }
}
