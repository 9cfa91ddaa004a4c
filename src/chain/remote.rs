//! HTTP access to remote risk services
//!
//! A single `get_json` call per query; retries and waits are layered on
//! top by the risk filters, never here.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// One-shot JSON query against a remote service
#[async_trait]
pub trait RemoteCheckClient: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value>;
}

/// `RemoteCheckClient` backed by reqwest
pub struct HttpCheckClient {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpCheckClient {
    /// Create a client; `None` leaves requests unbounded
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("pool-guard/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Build from `request_timeout_ms`, where 0 means unbounded
    pub fn from_timeout_ms(timeout_ms: u64) -> Result<Self> {
        Self::new((timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)))
    }
}

#[async_trait]
impl RemoteCheckClient for HttpCheckClient {
    async fn get_json(&self, url: &str) -> Result<Value> {
        debug!(url = %url, "Remote query");

        let mut request = self.client.get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| match self.timeout {
                Some(timeout) if e.is_timeout() => Error::RemoteTimeout(timeout.as_millis() as u64),
                _ => Error::Remote(format!("Request to {} failed: {}", url, e)),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!("{} returned {}: {}", url, status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse response from {}: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one JSON response after `delay`, returning the base URL
    async fn slow_server(body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(delay).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_client_builds() {
        assert!(HttpCheckClient::new(Some(Duration::from_secs(5))).is_ok());
        assert!(HttpCheckClient::new(None).is_ok());
    }

    #[tokio::test]
    async fn test_zero_timeout_ms_is_unbounded() {
        let url = slow_server(r#"{"score":900}"#, Duration::from_millis(20)).await;
        let client = HttpCheckClient::from_timeout_ms(0).unwrap();

        let report = client.get_json(&format!("{}/report", url)).await.unwrap();
        assert_eq!(report["score"], 900);
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let url = slow_server(r#"{"score":900}"#, Duration::from_millis(500)).await;
        let client = HttpCheckClient::from_timeout_ms(50).unwrap();

        let result = client.get_json(&format!("{}/report", url)).await;
        assert!(matches!(result, Err(Error::RemoteTimeout(50))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error() {
        let client = HttpCheckClient::new(Some(Duration::from_millis(500))).unwrap();
        // Port 9 (discard) on localhost is expected to refuse connections
        let result = client.get_json("http://127.0.0.1:9/report").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().is_retryable());
    }
}
