//! Mock HTTP transport for testing.

use crate::errors::TransportError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mock HTTP response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
    /// When set, the transport fails with this message instead of responding.
    pub failure: Option<String>,
}

impl MockResponse {
    /// Create a response with the given status and empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            failure: None,
        }
    }

    /// Create a 200 OK response with empty body.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Create a 202 Accepted response, what `sendMail` and `send` return.
    pub fn accepted() -> Self {
        Self::new(StatusCode::ACCEPTED)
    }

    /// Create a 201 Created response with a JSON body.
    pub fn created(body: serde_json::Value) -> Self {
        Self::json(StatusCode::CREATED, body)
    }

    /// Create a response with a JSON body.
    pub fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    /// Create a transport-level failure (nothing reaches the server).
    pub fn network_error(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(StatusCode::OK)
        }
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header. Invalid names or values are ignored.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Converts into the transport's response type.
    pub fn into_response(self) -> HttpResponse {
        HttpResponse::new(self.status, self.headers, self.body)
    }
}

/// Mock HTTP transport for testing.
///
/// Returns queued responses in order and records every request.
pub struct MockTransport {
    /// Queue of responses to return.
    responses: Mutex<Vec<MockResponse>>,
    /// Recorded requests.
    requests: Mutex<Vec<HttpRequest>>,
    /// Default response if no responses are queued.
    default_response: Option<MockResponse>,
}

impl MockTransport {
    /// Create a new mock transport with no responses.
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Create a mock transport with queued responses.
    pub fn with_responses(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            default_response: None,
        }
    }

    /// Create a mock transport with a default response.
    pub fn with_default(response: MockResponse) -> Self {
        Self {
            default_response: Some(response),
            ..Self::new()
        }
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Get the last request made.
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Number of queued responses not consumed yet.
    pub fn pending_responses(&self) -> usize {
        lock(&self.responses).len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request);

        let response = {
            let mut responses = lock(&self.responses);
            if responses.is_empty() {
                self.default_response.clone()
            } else {
                Some(responses.remove(0))
            }
        };

        match response {
            Some(MockResponse {
                failure: Some(message),
                ..
            }) => Err(TransportError::Network(message)),
            Some(mock) => Ok(mock.into_response()),
            None => Err(TransportError::Network(
                "No mock response available".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued_responses", &lock(&self.responses).len())
            .field("recorded_requests", &lock(&self.requests).len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
