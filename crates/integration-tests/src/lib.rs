//! Integration tests for the e-commerce API.
//!
//! # Running Tests
//!
//! ```bash
//! # Black-box HTTP tests against the in-memory store
//! cargo test -p ecommerce-integration-tests
//!
//! # PostgreSQL store tests (drop and recreate the `shop` schema!)
//! TEST_DATABASE_URL=postgres://localhost/ecommerce_test \
//!     cargo test -p ecommerce-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `api_memory` - HTTP contract over the real router, in-memory store
//! - `postgres_store` - Store semantics and HTTP flow over `PostgreSQL`

use ecommerce_api::app::build_app;
use ecommerce_api::config::{ApiConfig, ConfigError};
use ecommerce_api::db::Store;
use ecommerce_api::state::AppState;
use reqwest::{Client, Response};
use serde_json::Value;

/// The real router served on an ephemeral port.
///
/// The server task is aborted when this value is dropped.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Serve `store` with `POST /reset-database` enabled or not.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn(store: impl Store + 'static, allow_reset: bool) -> Self {
        let config = test_config(allow_reset).expect("test configuration is valid");
        let app = build_app(AppState::new(config, store));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().expect("bound listener has an address");
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server error");
        });

        Self {
            base_url,
            client: Client::new(),
            handle,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// POST `body` as JSON to `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    /// PUT `body` as JSON to `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    /// PUT with no body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn put_empty(&self, path: &str) -> Response {
        self.client
            .put(self.url(path))
            .send()
            .await
            .expect("PUT request failed")
    }

    /// DELETE `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE request failed")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Configuration for a test server. Storage is chosen by the caller.
///
/// # Errors
///
/// Never fails for the fixed variable set used here.
pub fn test_config(allow_reset: bool) -> Result<ApiConfig, ConfigError> {
    ApiConfig::from_vars(|key| match key {
        "API_STORAGE" => Some("memory".to_string()),
        "API_ALLOW_RESET" => Some(allow_reset.to_string()),
        _ => None,
    })
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn json_body(response: Response) -> Value {
    response.json().await.expect("response body is JSON")
}
