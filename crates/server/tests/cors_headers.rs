//! Exercises the CORS policy through the full application router.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;

use shoplens_server::app;
use shoplens_server::config::ServerConfig;
use shoplens_server::shopify::ShopifyClient;
use shoplens_server::state::AppState;

fn test_config(frontend_urls: Vec<String>) -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        shopify_api_version: "2024-01".to_string(),
        shopify_http_timeout: Duration::from_secs(5),
        scheduler_enabled: false,
        sync_cron: "0 0 */6 * * *".to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        frontend_urls,
    }
}

async fn spawn(frontend_urls: Vec<String>) -> SocketAddr {
    let config = test_config(frontend_urls);
    // Lazy pool; /health never touches the database.
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap();
    let client = ShopifyClient::new(&config.shopify_api_version, config.shopify_http_timeout);
    let router = app(AppState::new(config, pool, client));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn header<'a>(response: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn local_dev_origins_are_allowed_by_default() {
    let addr = spawn(Vec::new()).await;

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/health"))
        .header("Origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();

    assert_eq!(
        header(&response, "access-control-allow-origin"),
        Some("http://localhost:5173")
    );
    assert_eq!(
        header(&response, "access-control-allow-credentials"),
        Some("true")
    );
}

#[tokio::test]
async fn configured_frontend_origin_is_allowed() {
    let addr = spawn(vec!["https://dashboard.example.com".to_string()]).await;

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/health"))
        .header("Origin", "https://dashboard.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(
        header(&response, "access-control-allow-origin"),
        Some("https://dashboard.example.com")
    );
}

#[tokio::test]
async fn unknown_origins_get_no_cors_headers() {
    let addr = spawn(Vec::new()).await;

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/health"))
        .header("Origin", "https://evil.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert!(header(&response, "access-control-allow-origin").is_none());
}

#[tokio::test]
async fn preflight_reports_allowed_methods() {
    let addr = spawn(Vec::new()).await;

    let response = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{addr}/api/tenants"),
        )
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(
        header(&response, "access-control-allow-origin"),
        Some("http://localhost:3000")
    );
    let methods = header(&response, "access-control-allow-methods").unwrap();
    assert!(methods.contains("POST"));
    assert!(methods.contains("PUT"));
}
