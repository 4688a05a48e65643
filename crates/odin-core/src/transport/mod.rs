//! Request/response access to an odin control server.
//!
//! Every attribute and every builder shares one [`Connection`]. The HTTP
//! implementation may be closed after discovery; later requests re-open it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use odin_core::transport::{Connection, HttpConnection};
//!
//! #[tokio::main]
//! async fn main() -> odin_core::Result<()> {
//!     let connection = HttpConnection::new("127.0.0.1", 8888);
//!     let adapters = connection.get("api/0.1/adapters", &[]).await?;
//!     println!("{adapters}");
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};

#[cfg(test)]
pub(crate) mod mock;

/// Header asking the server to answer with metadata objects instead of values
pub const REQUEST_METADATA_HEADER: (&str, &str) = ("Accept", "application/json;metadata=true");

/// Shared connection to the remote parameter tree
#[async_trait]
pub trait Connection: Send + Sync {
    /// GET a path, with optional extra headers, returning the parsed body.
    async fn get(&self, path: &str, headers: &[(&str, &str)]) -> Result<Value>;

    /// PUT a value to a path, returning the parsed body.
    async fn put(&self, path: &str, value: &Value) -> Result<Value>;

    /// Prepare the connection for use.
    async fn open(&self) {}

    /// Release resources; a later request may re-open.
    async fn close(&self) {}
}

/// HTTP connection to an odin control server
pub struct HttpConnection {
    /// Base URL for requests, ending in `/`
    base_url: String,
    /// HTTP client, `None` while closed
    client: RwLock<Option<reqwest::Client>>,
}

impl HttpConnection {
    /// Create a connection to `http://{host}:{port}/`
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            base_url: format!("http://{}:{}/", host, port),
            client: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Current client, opening one if the connection is closed
    async fn client(&self) -> reqwest::Client {
        if let Some(client) = self.client.read().await.as_ref() {
            return client.clone();
        }
        let mut guard = self.client.write().await;
        guard.get_or_insert_with(reqwest::Client::new).clone()
    }

    async fn send(&self, path: &str, request: reqwest::RequestBuilder) -> Result<Value> {
        let resp = request.send().await?;

        let status = resp.status();
        if status.is_success() {
            let body = resp.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(Error::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn get(&self, path: &str, headers: &[(&str, &str)]) -> Result<Value> {
        let url = self.url(path);
        debug!("API request: GET {}", url);

        let mut req = self.client().await.get(&url);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        self.send(path, req).await
    }

    async fn put(&self, path: &str, value: &Value) -> Result<Value> {
        let url = self.url(path);
        debug!("API request: PUT {} = {}", url, value);

        let req = self.client().await.put(&url).json(value);
        self.send(path, req).await
    }

    async fn open(&self) {
        let mut guard = self.client.write().await;
        if guard.is_none() {
            *guard = Some(reqwest::Client::new());
        }
    }

    async fn close(&self) {
        self.client.write().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let connection = HttpConnection::new("127.0.0.1", 8888);
        assert_eq!(connection.base_url(), "http://127.0.0.1:8888/");
        assert_eq!(
            connection.url("api/0.1/adapters"),
            "http://127.0.0.1:8888/api/0.1/adapters"
        );
        assert_eq!(connection.url("/api/0.1/fp"), "http://127.0.0.1:8888/api/0.1/fp");
    }

    #[tokio::test]
    async fn test_close_then_reopen() {
        let connection = HttpConnection::new("localhost", 1);
        connection.open().await;
        assert!(connection.client.read().await.is_some());

        connection.close().await;
        assert!(connection.client.read().await.is_none());

        let _ = connection.client().await;
        assert!(connection.client.read().await.is_some());
    }
}
