use super::client::HttpClient;
use super::error::FetchError;
use super::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// In-memory HTTP client serving canned responses
///
/// Responses are registered per URL fragment; the first route whose fragment
/// is contained in the request URL answers. Each route pops its queue in
/// order and keeps repeating its last response.
pub struct MockHttpClient {
    routes: Mutex<Vec<MockRoute>>,
    requests: Mutex<Vec<HttpRequest>>,
    name: String,
}

struct MockRoute {
    fragment: String,
    responses: VecDeque<MockResponse>,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub error: Option<FetchError>,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self::ok(value.to_string())
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            error: None,
        }
    }

    pub fn error(error: FetchError) -> Self {
        Self {
            status: 0,
            body: String::new(),
            error: Some(error),
        }
    }
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::with_name("MockHttp")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            name: name.into(),
        }
    }

    pub fn respond(&self, fragment: impl Into<String>, response: MockResponse) {
        let fragment = fragment.into();
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|r| r.fragment == fragment) {
            Some(route) => route.responses.push_back(response),
            None => routes.push(MockRoute {
                fragment,
                responses: VecDeque::from([response]),
            }),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(request.clone());

        let response = {
            let mut routes = self.routes.lock().unwrap();
            let route = routes
                .iter_mut()
                .find(|r| request.url.contains(&r.fragment))
                .ok_or_else(|| {
                    FetchError::network(format!("MockHttpClient: no route for {}", request.url))
                })?;

            if route.responses.len() > 1 {
                route.responses.pop_front()
            } else {
                route.responses.front().cloned()
            }
        }
        .ok_or_else(|| FetchError::network("MockHttpClient: empty route"))?;

        if let Some(error) = response.error {
            return Err(error);
        }

        Ok(HttpResponse::new(request.url, response.status, response.body))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MockHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpClient")
            .field("name", &self.name)
            .field("requests", &self.requests.lock().unwrap().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_routes_by_fragment() {
        let client = MockHttpClient::new();
        client.respond("room_init", MockResponse::ok("init"));
        client.respond("getRoomPlayInfo", MockResponse::ok("play"));

        let resp = client
            .send(HttpRequest::get("https://api/room/v1/Room/room_init?id=1"))
            .await
            .unwrap();
        assert_eq!(resp.body, "init");

        let resp = client
            .send(HttpRequest::get("https://api/getRoomPlayInfo"))
            .await
            .unwrap();
        assert_eq!(resp.body, "play");
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_client_queue_repeats_last() {
        let client = MockHttpClient::new();
        client.respond("x", MockResponse::status(500, "first"));
        client.respond("x", MockResponse::ok("second"));

        let first = client.send(HttpRequest::get("x")).await.unwrap();
        let second = client.send(HttpRequest::get("x")).await.unwrap();
        let third = client.send(HttpRequest::get("x")).await.unwrap();

        assert_eq!(first.status, 500);
        assert_eq!(second.body, "second");
        assert_eq!(third.body, "second");
        assert_eq!(client.request_count("x"), 3);
    }

    #[tokio::test]
    async fn test_mock_client_errors() {
        let client = MockHttpClient::new();
        client.respond("down", MockResponse::error(FetchError::Timeout { seconds: 30 }));

        let err = client.send(HttpRequest::get("down")).await.unwrap_err();
        assert_eq!(err, FetchError::Timeout { seconds: 30 });

        let err = client.send(HttpRequest::get("unknown")).await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }
}
