//! Errors returned by the Nordigen client.
//!
//! Non-2xx responses are decoded into a [`ProviderError`]. A handful of
//! provider error shapes carry a meaning callers want to branch on, so
//! [`ProviderError::classify`] turns them into the sentinel variants of
//! [`Error`]. Everything it does not recognise is passed through untouched.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::http::HttpError;

static ORDER_NOT_FOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^OrderID \d+ doesn't exist$").expect("order id pattern is valid"));

/// Result alias used by every public client operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`crate::NordigenClient`] operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The access token was rejected by the provider.
    #[error("invalid token")]
    InvalidToken,

    /// The institution's daily request quota is used up.
    #[error("daily request limit set by the Institution has been exceeded")]
    RateLimit,

    /// The requested resource does not exist.
    #[error("not found")]
    NotFound,

    /// A provider error with no dedicated variant.
    #[error(transparent)]
    Provider(ProviderError),

    /// The request never produced a provider answer.
    #[error(transparent)]
    Http(HttpError),
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status(provider) => provider.classify(),
            other => Error::Http(other),
        }
    }
}

/// An error body returned by the provider.
///
/// `status_code` is the code the provider put in the body, `http_status`
/// the one on the response line. `data` keeps the raw body text so that
/// unstructured errors such as field validation failures stay readable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderError {
    pub summary: String,
    pub detail: String,
    pub error_type: String,
    pub status_code: u16,
    pub http_status: u16,
    pub data: String,
}

impl ProviderError {
    /// Decodes an error response body.
    ///
    /// Bodies that are not JSON objects still produce an error carrying the
    /// HTTP status and the raw text.
    pub fn from_response(http_status: StatusCode, body: &[u8]) -> Self {
        let mut error = ProviderError {
            http_status: http_status.as_u16(),
            data: String::from_utf8_lossy(body).trim().to_string(),
            ..Default::default()
        };

        if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) {
            error.summary = text_field(&fields, "summary");
            error.detail = text_field(&fields, "detail");
            error.error_type = text_field(&fields, "type");
            error.status_code = fields
                .get("status_code")
                .and_then(Value::as_u64)
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or_default();
        }

        error
    }

    /// Maps recognised provider errors to their sentinel; the first match wins.
    pub fn classify(self) -> Error {
        if self.error_type.eq_ignore_ascii_case("RateLimitError") {
            return Error::RateLimit;
        }

        if self.summary.eq_ignore_ascii_case("invalid token") {
            return Error::InvalidToken;
        }

        if !self.detail.is_empty() && ORDER_NOT_FOUND.is_match(&self.detail) {
            return Error::NotFound;
        }

        if self.http_status == StatusCode::NOT_FOUND.as_u16() {
            return Error::NotFound;
        }

        Error::Provider(self)
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    fields.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.summary.is_empty(), self.detail.is_empty()) {
            (false, false) => write!(
                f,
                "nordigen error: {}: {} - {}",
                self.status_code, self.summary, self.detail
            ),
            (false, true) => write!(f, "nordigen error: {}, {}", self.status_code, self.summary),
            (true, false) => write!(f, "nordigen error: {}, {}", self.status_code, self.detail),
            (true, true) => write!(f, "nordigen error: {}, {}", self.http_status, self.data),
        }
    }
}

impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(status: u16, body: &str) -> ProviderError {
        ProviderError::from_response(StatusCode::from_u16(status).unwrap(), body.as_bytes())
    }

    #[test]
    fn test_display_with_summary_and_detail() {
        let err = decode(
            401,
            r#"{"summary":"Authentication failed","detail":"No active account found with the given credentials","status_code":401}"#,
        );
        assert_eq!(
            err.to_string(),
            "nordigen error: 401: Authentication failed - No active account found with the given credentials"
        );
    }

    #[test]
    fn test_display_falls_back_to_raw_body() {
        let body = r#"{"secret_id":["This field may not be blank."],"status_code":400}"#;
        let err = decode(400, body);
        assert_eq!(err.status_code, 400);
        assert_eq!(err.to_string(), format!("nordigen error: 400, {}", body));
    }

    #[test]
    fn test_display_single_field() {
        assert_eq!(
            decode(400, r#"{"summary":"Bad request","status_code":400}"#).to_string(),
            "nordigen error: 400, Bad request"
        );
        assert_eq!(
            decode(400, r#"{"detail":"Something is off","status_code":400}"#).to_string(),
            "nordigen error: 400, Something is off"
        );
    }

    #[test]
    fn test_non_json_body_is_kept() {
        let err = decode(502, "<html>Bad Gateway</html>\n");
        assert_eq!(err.summary, "");
        assert_eq!(err.data, "<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "nordigen error: 502, <html>Bad Gateway</html>");
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = decode(
            429,
            r#"{"summary":"Rate limit exceeded","detail":"Try again later","type":"RateLimitError","status_code":429}"#,
        );
        assert!(matches!(err.classify(), Error::RateLimit));
    }

    #[test]
    fn test_classify_invalid_token_is_case_insensitive() {
        let err = decode(
            401,
            r#"{"summary":"Invalid token","detail":"Token is invalid or expired","status_code":401}"#,
        );
        assert!(matches!(err.classify(), Error::InvalidToken));
    }

    #[test]
    fn test_classify_missing_order() {
        let err = decode(400, r#"{"summary":"Bad order","detail":"OrderID 1234 doesn't exist"}"#);
        assert!(matches!(err.classify(), Error::NotFound));

        let err = decode(400, r#"{"detail":"OrderID abc doesn't exist"}"#);
        assert!(matches!(err.classify(), Error::Provider(_)));
    }

    #[test]
    fn test_classify_http_not_found() {
        let err = decode(404, r#"{"detail":"Not found.","status_code":404}"#);
        assert!(matches!(err.classify(), Error::NotFound));
    }

    #[test]
    fn test_rate_limit_takes_precedence_over_summary() {
        let err = decode(429, r#"{"summary":"invalid token","type":"ratelimiterror","status_code":404}"#);
        assert!(matches!(err.classify(), Error::RateLimit));
    }

    #[test]
    fn test_unrecognised_error_keeps_message() {
        let err = decode(
            401,
            r#"{"summary":"Authentication failed","detail":"No active account found with the given credentials","status_code":401}"#,
        );
        let classified = err.clone().classify();
        assert_eq!(classified.to_string(), err.to_string());
        match classified {
            Error::Provider(inner) => assert_eq!(inner, err),
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_sentinel_messages() {
        assert_eq!(Error::InvalidToken.to_string(), "invalid token");
        assert_eq!(
            Error::RateLimit.to_string(),
            "daily request limit set by the Institution has been exceeded"
        );
        assert_eq!(Error::NotFound.to_string(), "not found");
    }

    #[test]
    fn test_http_error_conversion_classifies_status() {
        let status = HttpError::Status(decode(404, ""));
        assert!(matches!(Error::from(status), Error::NotFound));

        let json = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(Error::from(HttpError::Json(json)), Error::Http(HttpError::Json(_))));
    }
}
