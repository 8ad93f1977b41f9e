use reqwest::header::{AUTHORIZATION, HeaderValue};

use super::error::HttpError;

/// Adds credentials to an outgoing request.
///
/// [`authorize`](Authorization::authorize) runs once everything else has
/// been set on the request and before it is audited and sent, so it sees
/// the final URL, headers and body.
pub trait Authorization: Send + Sync {
    fn authorize(&self, request: reqwest::Request) -> Result<reqwest::Request, HttpError>;
}

/// Sends an access token as `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct BearerAuthorization {
    access_token: String,
}

impl BearerAuthorization {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for BearerAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuthorization")
            .field("access_token", &crate::log::mask_secret(&self.access_token))
            .finish()
    }
}

impl Authorization for BearerAuthorization {
    fn authorize(&self, mut request: reqwest::Request) -> Result<reqwest::Request, HttpError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.access_token))
            .map_err(|e| HttpError::InvalidHeader(format!("authorization: {e}")))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(request)
    }
}
