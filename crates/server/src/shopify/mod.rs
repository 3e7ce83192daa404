//! Shopify REST Admin API client.
//!
//! Fetches complete collections of customers, orders and products for a
//! tenant, transparently walking cursor-based pagination, and provides a
//! lightweight connection test used at onboarding.
//!
//! The client performs no retries and no backoff: any HTTP-level failure
//! propagates as a [`ShopifyError`] and the pipeline treats the whole
//! entity-type sync as failed.

mod client;
pub mod types;

pub use client::{DEFAULT_PAGE_SIZE, ShopifyClient};

use serde::Serialize;
use thiserror::Error;

/// Errors returned by the Shopify Admin API client.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// Network-level failure (DNS, connect, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Shopify API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result of the onboarding connection test against `/shop.json`.
///
/// Mirrors the wire shape consumed by the dashboard: a failed check carries a
/// human-readable reason and, when the API answered at all, the HTTP status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCheck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ConnectionCheck {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
            status: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = ShopifyError::Status {
            status: 401,
            message: "[API] Invalid API key or access token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Shopify API returned 401: [API] Invalid API key or access token"
        );
    }

    #[test]
    fn connection_check_serializes_compactly_on_success() {
        let json = serde_json::to_value(ConnectionCheck::ok()).unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }

    #[test]
    fn connection_check_carries_status_on_api_rejection() {
        let json = serde_json::to_value(ConnectionCheck::failed("unauthorized", Some(401))).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["status"], 401);
    }
}
