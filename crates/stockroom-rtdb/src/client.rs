//! Realtime Database REST client.
//!
//! Thin client over the store's tree primitives:
//! - Append with store-generated keys, full overwrites, removes, reads
//! - Long-lived event stream subscriptions
//! - HTTP client tuning (pooling, timeouts)
//! - Observability (tracing spans, metrics)

use std::time::{Duration, Instant};

use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{info_span, Instrument};
use url::Url;

use stockroom_models::RecordId;

use crate::error::{RtdbError, RtdbResult};
use crate::metrics::record_request;
use crate::path::{CollectionPath, NodePath};
use crate::stream::EventStream;
use crate::types::PushResponse;

// =============================================================================
// Configuration
// =============================================================================

/// Realtime Database client configuration.
#[derive(Debug, Clone)]
pub struct RtdbConfig {
    /// Database root URL, e.g. `https://example-db.firebaseio.com`
    pub database_url: Url,
    /// Request timeout for unary requests
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl RtdbConfig {
    /// Create a config with default timeouts.
    pub fn new(database_url: Url) -> Self {
        Self {
            database_url,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> RtdbResult<Self> {
        let raw = std::env::var("RTDB_DATABASE_URL")
            .or_else(|_| std::env::var("FIREBASE_DATABASE_URL"))
            .map_err(|_| {
                RtdbError::config_error(
                    "RTDB_DATABASE_URL or FIREBASE_DATABASE_URL must be set to reach the database",
                )
            })?;

        if raw.is_empty() {
            return Err(RtdbError::config_error(
                "RTDB_DATABASE_URL or FIREBASE_DATABASE_URL cannot be empty",
            ));
        }

        let database_url = Url::parse(&raw).map_err(|e| {
            RtdbError::config_error(format!("Invalid database URL {:?}: {}", raw, e))
        })?;

        let timeout_secs: u64 = std::env::var("RTDB_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let connect_timeout_secs: u64 = std::env::var("RTDB_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            database_url,
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Realtime Database REST client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct RtdbClient {
    http: Client,
    config: RtdbConfig,
    base_url: String,
}

impl RtdbClient {
    /// Create a new client.
    pub fn new(config: RtdbConfig) -> RtdbResult<Self> {
        // Timeout is applied per request; a builder-level timeout would also
        // cut off long-lived event streams.
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("stockroom-rtdb/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RtdbError::Network)?;

        let base_url = config.database_url.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> RtdbResult<Self> {
        let config = RtdbConfig::from_env()?;
        Self::new(config)
    }

    /// REST endpoint for a tree path.
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }

    // =========================================================================
    // Tree Operations
    // =========================================================================

    /// Append a value under a collection. The store generates the key.
    pub async fn push(&self, path: &CollectionPath, value: &Value) -> RtdbResult<RecordId> {
        let url = self.endpoint(path.as_str());

        self.execute_request("push", path.as_str(), async {
            let response = self
                .http
                .post(&url)
                .timeout(self.config.timeout)
                .json(value)
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    let body = response.text().await?;
                    let push: PushResponse = serde_json::from_str(&body).map_err(|e| {
                        let prefix: String = body.chars().take(200).collect();
                        RtdbError::invalid_response(format!(
                            "Failed to parse push response: {} (body prefix: {})",
                            e, prefix
                        ))
                    })?;
                    RecordId::new(&push.name).map_err(|e| {
                        RtdbError::invalid_response(format!(
                            "Push returned unusable key {:?}: {}",
                            push.name, e
                        ))
                    })
                }
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Fully overwrite the value at a record node.
    pub async fn put(&self, path: &NodePath, value: &Value) -> RtdbResult<()> {
        let url = self.endpoint(path.as_str());

        self.execute_request("put", path.as_str(), async {
            let response = self
                .http
                .put(&url)
                .timeout(self.config.timeout)
                .json(value)
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => Ok(()),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Remove the node at a path. Removing an absent node succeeds.
    pub async fn remove(&self, path: &NodePath) -> RtdbResult<()> {
        let url = self.endpoint(path.as_str());

        self.execute_request("remove", path.as_str(), async {
            let response = self
                .http
                .delete(&url)
                .timeout(self.config.timeout)
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Read the value at a record node. Absent nodes read as `None`.
    pub async fn get_node(&self, path: &NodePath) -> RtdbResult<Option<Value>> {
        self.get_raw("get", path.as_str()).await
    }

    /// Read a whole collection subtree. An empty collection reads as `None`.
    pub async fn get_tree(&self, path: &CollectionPath) -> RtdbResult<Option<Value>> {
        self.get_raw("get_tree", path.as_str()).await
    }

    async fn get_raw(&self, operation: &'static str, path: &str) -> RtdbResult<Option<Value>> {
        let url = self.endpoint(path);

        self.execute_request(operation, path, async {
            let response = self
                .http
                .get(&url)
                .timeout(self.config.timeout)
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    // Absent nodes read as 200 with a `null` body, not 404.
                    let value: Value = response.json().await?;
                    if value.is_null() {
                        Ok(None)
                    } else {
                        Ok(Some(value))
                    }
                }
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Open the store's notification stream for a collection subtree.
    ///
    /// The connection stays open until the returned stream is dropped.
    pub async fn stream(&self, path: &CollectionPath) -> RtdbResult<EventStream> {
        let url = self.endpoint(path.as_str());

        self.execute_request("stream", path.as_str(), async {
            // Streaming requests may be redirected to a session host; the
            // default redirect policy follows it.
            let response = self
                .http
                .get(&url)
                .header(ACCEPT, "text/event-stream")
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => Ok(EventStream::new(response)),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, path: &str, fut: F) -> RtdbResult<T>
    where
        F: std::future::Future<Output = RtdbResult<T>>,
    {
        let span = info_span!("rtdb_request", operation = %operation, path = %path);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> RtdbError {
        let body = response.text().await.unwrap_or_default();
        RtdbError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}
