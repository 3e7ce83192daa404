//! Exercises the Shopify client's cursor pagination and connection test
//! against a local mock of the Admin API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use shoplens_server::shopify::ShopifyClient;

#[derive(Clone)]
struct MockState {
    requests: Arc<AtomicUsize>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page_info: Option<String>,
    limit: Option<String>,
}

fn products(count: usize, offset: i64) -> serde_json::Value {
    let items: Vec<_> = (0..count)
        .map(|i| json!({"id": offset + i as i64, "title": format!("Product {}", offset + i as i64)}))
        .collect();
    json!({ "products": items })
}

fn link_next(cursor: &str) -> String {
    format!(
        "<https://mock.example/admin/api/2024-01/products.json?page_info={cursor}&limit=250>; rel=\"next\""
    )
}

async fn products_page(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);

    assert_eq!(
        headers
            .get("X-Shopify-Access-Token")
            .and_then(|v| v.to_str().ok()),
        Some("shpat_mock_token")
    );
    assert_eq!(query.limit.as_deref(), Some("250"));

    match query.page_info.as_deref() {
        None => {
            let mut headers = HeaderMap::new();
            headers.insert("Link", link_next("page2").parse().unwrap());
            (headers, Json(products(250, 0))).into_response()
        }
        Some("page2") => {
            let mut headers = HeaderMap::new();
            headers.insert("Link", link_next("page3").parse().unwrap());
            (headers, Json(products(250, 250))).into_response()
        }
        Some("page3") => Json(products(37, 500)).into_response(),
        Some(other) => panic!("unexpected cursor: {other}"),
    }
}

async fn shop_unauthorized() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"errors": "[API] Invalid API key or access token"})),
    )
}

async fn shop_ok() -> impl IntoResponse {
    Json(json!({"shop": {"id": 1, "name": "Mock Shop", "myshopify_domain": "mock.myshopify.com"}}))
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn pagination_walks_all_pages_exactly_once() {
    let requests = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/admin/api/2024-01/products.json", get(products_page))
        .with_state(MockState {
            requests: Arc::clone(&requests),
        });
    let addr = spawn(router).await;

    let base = Url::parse(&format!("http://{addr}/admin/api/2024-01")).unwrap();
    let client = ShopifyClient::with_base_url(base);

    let products = client
        .fetch_products("ignored.myshopify.com", "shpat_mock_token")
        .await
        .unwrap();

    assert_eq!(products.len(), 537);
    assert_eq!(requests.load(Ordering::SeqCst), 3);
    // Upstream order is preserved across page boundaries
    assert_eq!(products[0].id, 0);
    assert_eq!(products[250].id, 250);
    assert_eq!(products[536].id, 536);
}

#[tokio::test]
async fn connection_test_reports_rejected_credentials() {
    let router = Router::new().route("/admin/api/2024-01/shop.json", get(shop_unauthorized));
    let addr = spawn(router).await;

    let base = Url::parse(&format!("http://{addr}/admin/api/2024-01")).unwrap();
    let client = ShopifyClient::with_base_url(base);

    let check = client
        .test_connection("ignored.myshopify.com", "shpat_bad_token")
        .await;

    assert!(!check.success);
    assert_eq!(check.status, Some(401));
    assert_eq!(
        check.error.as_deref(),
        Some("[API] Invalid API key or access token")
    );
}

#[tokio::test]
async fn connection_test_succeeds_against_live_shop() {
    let router = Router::new().route("/admin/api/2024-01/shop.json", get(shop_ok));
    let addr = spawn(router).await;

    let base = Url::parse(&format!("http://{addr}/admin/api/2024-01")).unwrap();
    let client = ShopifyClient::with_base_url(base);

    let check = client
        .test_connection("ignored.myshopify.com", "shpat_mock_token")
        .await;

    assert!(check.success);
    assert!(check.error.is_none());
}

#[tokio::test]
async fn connection_test_flags_unreachable_hosts() {
    // Port 9 is the discard port; nothing is listening there.
    let base = Url::parse("http://127.0.0.1:9/admin/api/2024-01").unwrap();
    let client = ShopifyClient::with_base_url(base);

    let check = client
        .test_connection("ignored.myshopify.com", "shpat_mock_token")
        .await;

    assert!(!check.success);
    assert_eq!(
        check.error.as_deref(),
        Some("Could not reach Shopify store. Check if the shop domain is correct.")
    );
    assert_eq!(check.status, None);
}
