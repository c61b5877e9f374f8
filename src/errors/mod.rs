//! Error types for the Office 365 mail integration.

use crate::services::DraftState;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Result type for Office 365 operations.
pub type Office365Result<T> = Result<T, Office365Error>;

/// Top-level error type for the Office 365 integration.
#[derive(Debug, Error)]
pub enum Office365Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Authorization error.
    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Resource error.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Throttling error.
    #[error("Throttling error: {0}")]
    Throttling(#[from] ThrottlingError),

    /// Upload error.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Server error.
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Response error.
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    /// A large send failed after its draft was created.
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

impl Office365Error {
    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Office365Error::Configuration(ConfigurationError::InvalidConfiguration(msg.into()))
    }

    /// Returns true if the error is transient.
    ///
    /// The client itself never retries; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Office365Error::Throttling(_)
            | Office365Error::Network(NetworkError::Timeout(_))
            | Office365Error::Network(NetworkError::ConnectionFailed(_))
            | Office365Error::Server(ServerError::ServiceUnavailable { .. })
            | Office365Error::Server(ServerError::GatewayTimeout(_)) => true,
            Office365Error::Upload(UploadError::FragmentFailed { status, .. }) => {
                status.map_or(true, |s| s.is_server_error())
            }
            _ => false,
        }
    }

    /// Returns the retry delay hint if the server sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Office365Error::Throttling(ThrottlingError::TooManyRequests { retry_after, .. }) => {
                *retry_after
            }
            Office365Error::Server(ServerError::ServiceUnavailable { retry_after, .. }) => {
                *retry_after
            }
            Office365Error::Delivery(e) => e.source.retry_after(),
            _ => None,
        }
    }

    /// Returns the HTTP status code if applicable.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Office365Error::Authentication(_) => Some(StatusCode::UNAUTHORIZED),
            Office365Error::Authorization(_) => Some(StatusCode::FORBIDDEN),
            Office365Error::Request(RequestError::PayloadTooLarge(_)) => {
                Some(StatusCode::PAYLOAD_TOO_LARGE)
            }
            Office365Error::Request(_) => Some(StatusCode::BAD_REQUEST),
            Office365Error::Resource(_) => Some(StatusCode::NOT_FOUND),
            Office365Error::Throttling(_) => Some(StatusCode::TOO_MANY_REQUESTS),
            Office365Error::Server(ServerError::InternalError(_)) => {
                Some(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Office365Error::Server(ServerError::BadGateway(_)) => Some(StatusCode::BAD_GATEWAY),
            Office365Error::Server(ServerError::ServiceUnavailable { .. }) => {
                Some(StatusCode::SERVICE_UNAVAILABLE)
            }
            Office365Error::Server(ServerError::GatewayTimeout(_)) => {
                Some(StatusCode::GATEWAY_TIMEOUT)
            }
            Office365Error::Upload(UploadError::FragmentFailed { status, .. }) => *status,
            Office365Error::Delivery(e) => e.source.status_code(),
            _ => None,
        }
    }

    /// Returns the identifier of the draft left on the server, if any.
    pub fn orphaned_draft_id(&self) -> Option<&str> {
        match self {
            Office365Error::Delivery(e) => Some(&e.draft_id),
            _ => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Missing credentials.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// Invalid token.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Expired token.
    #[error("Expired token: {0}")]
    ExpiredToken(String),

    /// Token request failed.
    #[error("Token request failed: {0}")]
    TokenRequestFailed(String),

    /// Invalid client credentials.
    #[error("Invalid client: {0}")]
    InvalidClient(String),
}

/// Authorization errors.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// Forbidden.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Mailbox not accessible by the application.
    #[error("Access denied: {0}")]
    AccessDenied(String),
}

/// Request errors.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Validation error.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Message has no sender.
    #[error("Message has no sender")]
    MissingSender,

    /// Invalid email address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Request entity too large.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Resource errors.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Mailbox not found.
    #[error("Mailbox not found: {0}")]
    MailboxNotFound(String),

    /// Message not found.
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Generic not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Throttling errors.
#[derive(Debug, Error)]
pub enum ThrottlingError {
    /// Too many requests.
    #[error("Too many requests: {message}")]
    TooManyRequests {
        /// Error message.
        message: String,
        /// Retry after duration.
        retry_after: Option<Duration>,
    },
}

/// Upload errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Upload session could not be created or was malformed.
    #[error("Upload session error: {0}")]
    SessionFailed(String),

    /// A fragment PUT failed.
    #[error("Fragment {index} ({range}) failed: {message}")]
    FragmentFailed {
        /// Zero-based fragment index.
        index: usize,
        /// The `Content-Range` value of the failed fragment.
        range: String,
        /// HTTP status, absent for transport failures.
        status: Option<StatusCode>,
        /// Error message.
        message: String,
    },

    /// Content does not match the session's declared size.
    #[error("Size mismatch: {0}")]
    SizeMismatch(String),
}

/// Network errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Timeout.
    #[error("Request timeout: {0}")]
    Timeout(String),
}

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Internal error.
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// Service unavailable.
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Error message.
        message: String,
        /// Retry after duration.
        retry_after: Option<Duration>,
    },

    /// Bad gateway.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Gateway timeout.
    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    /// Unexpected status code.
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status.
        status: StatusCode,
        /// Error message.
        message: String,
    },
}

/// Response errors.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

/// Failure of a large send after its draft exists.
///
/// The draft stays on the server in `state`; nothing is rolled back.
#[derive(Debug, Error)]
#[error("draft {draft_id} stopped in state {state:?}: {source}")]
pub struct DeliveryError {
    /// Identifier of the draft left behind.
    pub draft_id: String,
    /// The state the draft was in when the failure happened.
    pub state: DraftState,
    /// The underlying failure.
    #[source]
    pub source: Box<Office365Error>,
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network error.
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout error.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// HTTP error.
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<std::convert::Infallible> for Office365Error {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Network(err.to_string())
        } else {
            TransportError::Http(err.to_string())
        }
    }
}

impl From<TransportError> for Office365Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(msg) => Office365Error::Network(NetworkError::Timeout(msg)),
            TransportError::Network(msg) | TransportError::Http(msg) => {
                Office365Error::Network(NetworkError::ConnectionFailed(msg))
            }
        }
    }
}
