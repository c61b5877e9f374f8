//! Request executor with auth, error mapping and logging.

use crate::auth::AccessToken;
use crate::config::Office365Config;
use crate::errors::{
    AuthenticationError, AuthorizationError, ConfigurationError, Office365Error, Office365Result,
    RequestError, ResourceError, ResponseError, ServerError, ThrottlingError, TransportError,
};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::types::GraphErrorResponse;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Request executor that sends authenticated Graph requests and maps errors.
///
/// Holds the single access token of its client. The token is never refreshed;
/// once it reports expiry every call fails with
/// [`AuthenticationError::ExpiredToken`].
pub struct RequestExecutor {
    /// Configuration
    config: Office365Config,
    /// HTTP transport
    transport: Arc<dyn HttpTransport>,
    /// Access token fetched when the client was created
    token: AccessToken,
}

impl RequestExecutor {
    /// Creates a new request executor.
    pub fn new(
        config: Office365Config,
        transport: Arc<dyn HttpTransport>,
        token: AccessToken,
    ) -> Self {
        Self {
            config,
            transport,
            token,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &Office365Config {
        &self.config
    }

    /// POSTs a JSON body and deserializes the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Office365Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(HttpMethod::Post, path, Some(encode(body)?)).await?;

        serde_json::from_slice(&response.body).map_err(|e| {
            Office365Error::Response(ResponseError::DeserializationError(format!(
                "Failed to deserialize response: {}",
                e
            )))
        })
    }

    /// POSTs a JSON body to an endpoint that answers without content.
    pub async fn post_json_no_content<B>(&self, path: &str, body: &B) -> Office365Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.execute(HttpMethod::Post, path, Some(encode(body)?)).await?;
        Ok(())
    }

    /// POSTs with an empty body.
    pub async fn post_empty(&self, path: &str) -> Office365Result<()> {
        self.execute(HttpMethod::Post, path, None).await?;
        Ok(())
    }

    /// PUTs raw bytes to an absolute, pre-authorised URL.
    ///
    /// No `Authorization` header is sent, redirects are not followed and the
    /// upload timeout applies. The response is returned as-is; status
    /// handling is up to the caller.
    pub async fn put_bytes(
        &self,
        url: Url,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<HttpResponse, TransportError> {
        let request = HttpRequest {
            method: HttpMethod::Put,
            url,
            headers,
            body: Some(body),
            timeout: Some(self.config.upload_timeout),
            follow_redirects: false,
        };

        self.transport.send(request).await
    }

    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Bytes>,
    ) -> Office365Result<HttpResponse> {
        let url = self.build_url(path)?;

        if self.token.is_expired() {
            warn!(url = %url, "Access token expired; create a new client");
            return Err(Office365Error::Authentication(AuthenticationError::ExpiredToken(
                "The client's access token has expired".to_string(),
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&self.token.authorization_header()).map_err(|e| {
                Office365Error::Authentication(AuthenticationError::InvalidToken(format!(
                    "Invalid auth header: {}",
                    e
                )))
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let http_request = HttpRequest {
            method,
            url,
            headers,
            body,
            timeout: Some(self.config.timeout),
            follow_redirects: true,
        };

        debug!(method = ?method, url = %http_request.url, "Sending Graph request");

        let response = self.transport.send(http_request).await.map_err(|e| {
            warn!(error = %e, "Graph request failed");
            Office365Error::from(e)
        })?;

        debug!(status = %response.status, "Graph response");

        if !response.status.is_success() {
            return Err(map_error_response(&response));
        }

        Ok(response)
    }

    /// Builds a full URL from a path relative to the base URL.
    pub fn build_url(&self, path: &str) -> Office365Result<Url> {
        let path = path.trim_start_matches('/');

        self.config.base_url.join(path).map_err(|e| {
            Office365Error::Configuration(ConfigurationError::InvalidUrl(format!(
                "{}: {}",
                path, e
            )))
        })
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Office365Result<Bytes> {
    serde_json::to_vec(body).map(Bytes::from).map_err(|e| {
        Office365Error::Request(RequestError::Serialization(format!(
            "Failed to serialize request: {}",
            e
        )))
    })
}

/// Maps a non-success Graph response to a domain error.
pub(crate) fn map_error_response(response: &HttpResponse) -> Office365Error {
    let status = response.status;

    let detail = serde_json::from_slice::<GraphErrorResponse>(&response.body)
        .ok()
        .map(|e| e.error);

    let (code, message) = match detail {
        Some(d) => {
            let message = if d.message.is_empty() {
                d.code.clone()
            } else {
                format!("{}: {}", d.code, d.message)
            };
            (Some(d.code), message)
        }
        None => (
            None,
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                String::from_utf8_lossy(&response.body)
            ),
        ),
    };

    let retry_after = response
        .headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    warn!(status = %status, code = ?code, "Graph returned an error");

    match status {
        StatusCode::BAD_REQUEST => match code.as_deref() {
            Some("ErrorInvalidRecipients") | Some("ErrorInvalidEmailAddress") => {
                Office365Error::Request(RequestError::InvalidAddress(message))
            }
            _ => Office365Error::Request(RequestError::ValidationError(message)),
        },
        StatusCode::UNAUTHORIZED => match code.as_deref() {
            Some("InvalidAuthenticationToken") if message.contains("expired") => {
                Office365Error::Authentication(AuthenticationError::ExpiredToken(message))
            }
            _ => Office365Error::Authentication(AuthenticationError::InvalidToken(message)),
        },
        StatusCode::FORBIDDEN => match code.as_deref() {
            Some("ErrorAccessDenied") | Some("AccessDenied") => {
                Office365Error::Authorization(AuthorizationError::AccessDenied(message))
            }
            _ => Office365Error::Authorization(AuthorizationError::Forbidden(message)),
        },
        StatusCode::NOT_FOUND => match code.as_deref() {
            Some("MailboxNotEnabledForRESTAPI") | Some("ErrorMailboxNotFound")
            | Some("ResourceNotFound") => {
                Office365Error::Resource(ResourceError::MailboxNotFound(message))
            }
            Some("ErrorItemNotFound") => {
                Office365Error::Resource(ResourceError::MessageNotFound(message))
            }
            _ => Office365Error::Resource(ResourceError::NotFound(message)),
        },
        StatusCode::PAYLOAD_TOO_LARGE => {
            Office365Error::Request(RequestError::PayloadTooLarge(message))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            Office365Error::Throttling(ThrottlingError::TooManyRequests {
                message,
                retry_after,
            })
        }
        StatusCode::INTERNAL_SERVER_ERROR => {
            Office365Error::Server(ServerError::InternalError(message))
        }
        StatusCode::BAD_GATEWAY => Office365Error::Server(ServerError::BadGateway(message)),
        StatusCode::SERVICE_UNAVAILABLE => {
            Office365Error::Server(ServerError::ServiceUnavailable {
                message,
                retry_after,
            })
        }
        StatusCode::GATEWAY_TIMEOUT => Office365Error::Server(ServerError::GatewayTimeout(message)),
        _ => Office365Error::Server(ServerError::UnexpectedStatus { status, message }),
    }
}
