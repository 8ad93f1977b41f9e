//! Error types for HTTP client operations.
//!
//! This module defines the [`HttpError`] enum which encompasses all possible
//! failure modes of a single round trip to the Nordigen API, before any
//! provider-specific classification has been applied.

use thiserror::Error;

use crate::error::ProviderError;

/// Errors that can occur while building, sending or decoding one request.
///
/// # Error Categories
///
/// - **Network errors**: [`RequestFailed`](HttpError::RequestFailed),
///   [`Middleware`](HttpError::Middleware)
/// - **Provider errors**: [`Status`](HttpError::Status)
/// - **Client errors**: [`Url`](HttpError::Url),
///   [`InvalidHeader`](HttpError::InvalidHeader),
///   [`Json`](HttpError::Json)
///
/// Callers of the resource methods never see [`Status`](HttpError::Status)
/// directly: it is converted into [`crate::Error`], which unwraps the
/// recognised provider errors into sentinels.
///
/// # Example
///
/// ```rust,no_run
/// use nordigen::http::HttpError;
///
/// fn handle_error(err: HttpError) {
///     match err {
///         HttpError::Status(provider) => {
///             eprintln!("Provider returned {}: {}", provider.http_status, provider);
///         }
///         HttpError::RequestFailed(e) => {
///             eprintln!("Network error: {}", e);
///         }
///         _ => eprintln!("Other error: {}", err),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum HttpError {
    /// The HTTP request failed due to a network or connection error.
    ///
    /// This typically indicates connectivity issues such as:
    /// - Connection refused
    /// - Connection timeout
    /// - DNS resolution failure
    /// - TLS/SSL handshake errors
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// An error raised by a middleware installed on the transport.
    #[error("Middleware error: {0}")]
    Middleware(reqwest_middleware::Error),

    /// The provider answered with a status code of 300 or above.
    ///
    /// The decoded error body is kept as-is; see [`ProviderError::classify`].
    #[error(transparent)]
    Status(ProviderError),

    /// Failed to parse or resolve a URL.
    ///
    /// This error occurs when joining the base URL with a path produces
    /// an invalid URL, or when the base URL itself is malformed.
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A header name or value could not be put on the wire.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Failed to serialize or deserialize JSON data.
    ///
    /// This error can occur during:
    /// - Serializing the request body to JSON
    /// - Deserializing the response body from JSON
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest_middleware::Error> for HttpError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => HttpError::RequestFailed(e),
            other => HttpError::Middleware(other),
        }
    }
}
