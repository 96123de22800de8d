use super::types::WireRequest;
use super::GenerationService;
use crate::settings::Endpoint;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

enum MockResponse {
    Body(Value),
    Status(u16, String),
}

/// Scripted [`GenerationService`] that records every request it receives.
#[derive(Clone)]
pub struct MockGenerationClient {
    responses: Arc<Mutex<Vec<MockResponse>>>,
    requests: Arc<Mutex<Vec<(Endpoint, Value)>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, body: Value) -> Self {
        self.responses.lock().unwrap().push(MockResponse::Body(body));
        self
    }

    pub fn with_error_status(self, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockResponse::Status(status, body.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Endpoints and JSON bodies of all requests, oldest first.
    pub fn get_requests(&self) -> Vec<(Endpoint, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate_content(&self, endpoint: &Endpoint, request: &WireRequest) -> Result<Value> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        self.requests
            .lock()
            .unwrap()
            .push((endpoint.clone(), serde_json::to_value(request)?));

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Default mock response
            return Ok(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "mock response"}]}}]
            }));
        }

        let index = (*count - 1) % responses.len();
        match &responses[index] {
            MockResponse::Body(body) => Ok(body.clone()),
            MockResponse::Status(status, body) => Err(Error::UpstreamTransport {
                status: Some(*status),
                body: body.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::assemble::connection_test;

    fn endpoint() -> Endpoint {
        Endpoint {
            api_key: "key".to_string(),
            api_url: "https://mock.example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_cycles_scripted_responses() {
        let client = MockGenerationClient::new()
            .with_response(serde_json::json!({"candidates": []}))
            .with_error_status(500, "boom");

        let first = client
            .generate_content(&endpoint(), &connection_test("a"))
            .await
            .unwrap();
        assert_eq!(first, serde_json::json!({"candidates": []}));

        let second = client
            .generate_content(&endpoint(), &connection_test("b"))
            .await
            .unwrap_err();
        assert!(matches!(
            second,
            Error::UpstreamTransport {
                status: Some(500),
                ..
            }
        ));

        assert_eq!(client.get_call_count(), 2);
        let requests = client.get_requests();
        assert_eq!(requests[1].1["contents"][0]["parts"][0]["text"], "b");
    }
}
