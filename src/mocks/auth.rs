//! Mock authentication provider.

use crate::auth::{AccessToken, AuthProvider};
use crate::errors::AuthenticationError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Auth provider returning a fixed token and counting how often it is asked.
#[derive(Debug, Clone)]
pub struct MockAuthProvider {
    token: Option<AccessToken>,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockAuthProvider {
    /// Provider that always returns `token`.
    pub fn new(token: AccessToken) -> Self {
        Self {
            token: Some(token),
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Provider returning a bearer token with no expiry.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(AccessToken::bearer(token))
    }

    /// Provider whose token request always fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            token: None,
            failure: Some(message.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Number of token requests so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn get_access_token(&self) -> Result<AccessToken, AuthenticationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match (&self.token, &self.failure) {
            (Some(token), None) => Ok(token.clone()),
            (_, Some(message)) => Err(AuthenticationError::TokenRequestFailed(message.clone())),
            (None, None) => Err(AuthenticationError::InvalidToken(
                "No mock token configured".to_string(),
            )),
        }
    }
}
