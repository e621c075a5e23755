use super::error::FetchError;
use super::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoClient;

    #[async_trait]
    impl HttpClient for EchoClient {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
            Ok(HttpResponse::new(request.url.clone(), 200, request.url))
        }

        fn name(&self) -> &str {
            "EchoClient"
        }
    }

    #[tokio::test]
    async fn test_client_trait() {
        let client = EchoClient;
        let resp = client
            .send(HttpRequest::get("https://example.com"))
            .await
            .unwrap();
        assert_eq!(client.name(), "EchoClient");
        assert_eq!(resp.body, "https://example.com");
    }
}
