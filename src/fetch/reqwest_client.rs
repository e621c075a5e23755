//! Production HTTP client backed by `reqwest`

use super::client::HttpClient;
use super::error::FetchError;
use super::types::{HttpRequest, HttpResponse, Method};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// HTTP client shared by every platform source and the playlist proxy
///
/// Holds a single connection pool; cloning the inner `reqwest::Client` is
/// cheap, so one instance is created at startup and shared through `Arc`.
pub struct ReqwestClient {
    http_client: Client,
    timeout: Duration,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Build {
                message: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            warn!("Request to {} timed out after {:?}", url, self.timeout);
            FetchError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            warn!("Cannot connect to {}", url);
            FetchError::network(format!("Connection failed: {}", e))
        } else {
            warn!("Request to {} failed: {}", url, e);
            FetchError::network(format!("Request failed: {}", e))
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let mut builder = match request.method {
            Method::Get => self.http_client.get(&request.url),
            Method::Post => self.http_client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| self.map_error(&request.url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_error(&request.url, e))?;

        debug!(
            url = %request.url,
            status,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "HTTP request completed"
        );

        Ok(HttpResponse::new(request.url, status, body))
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ReqwestClient::new(Duration::from_secs(30)).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(30));
        assert_eq!(client.name(), "reqwest");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = ReqwestClient::new(Duration::from_secs(2)).unwrap();
        let result = client
            .send(HttpRequest::get("http://127.0.0.1:1/unreachable"))
            .await;

        assert!(matches!(
            result,
            Err(FetchError::Network { .. }) | Err(FetchError::Timeout { .. })
        ));
    }
}
