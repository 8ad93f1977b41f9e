//! The Nordigen API client.
//!
//! [`NordigenClient`] owns the base URL, the transport and the auditor, and
//! hands out a fresh [`RequestBuilder`] for every call. Resource methods
//! live next to their types in [`crate::api`].

use std::sync::Arc;
use std::time::Duration;

use reqwest_middleware::ClientWithMiddleware;
use url::Url;

use crate::api::Token;
use crate::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, Settings};
use crate::error::Result;
use crate::http::{Auditor, BearerAuthorization, HttpError, LogAuditor, RequestBuilder};

/// Client for the Nordigen open-banking API.
///
/// Cloning is cheap; clones share the connection pool and the auditor.
///
/// # Example
///
/// ```rust,no_run
/// use nordigen::NordigenClient;
///
/// # async fn example() -> nordigen::Result<()> {
/// let client = NordigenClient::new()?;
/// let token = client.new_token("secret-id", "secret-key").await?;
///
/// for institution in client.list_institutions(&token, "PT").await? {
///     println!("{} ({})", institution.name, institution.id);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NordigenClient {
    base_url: Url,
    http_client: ClientWithMiddleware,
    auditor: Option<Arc<dyn Auditor>>,
    token: Token,
}

impl NordigenClient {
    /// Creates a client for `https://ob.nordigen.com` with a 30 second
    /// timeout and the [`LogAuditor`].
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Creates a client from loaded [`Settings`].
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url).map_err(HttpError::from)?;
        let builder = Self::builder()
            .with_base_url(base_url)
            .with_timeout(Duration::from_secs(settings.timeout_secs));

        if settings.audit {
            builder.build()
        } else {
            builder.without_auditor().build()
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The token set with [`ClientBuilder::with_token`], empty otherwise.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// A request without credentials.
    pub(crate) fn request(&self) -> RequestBuilder {
        RequestBuilder::new(self.base_url.clone(), self.http_client.clone(), self.auditor.clone())
    }

    /// A request carrying `token` as bearer credentials.
    pub(crate) fn authorized(&self, token: &Token, operation: &str) -> RequestBuilder {
        self.request()
            .with_authorization(BearerAuthorization::new(token.access.as_str()))
            .with_operation(operation)
    }
}

/// Builder for [`NordigenClient`].
pub struct ClientBuilder {
    base_url: Option<Url>,
    http_client: Option<ClientWithMiddleware>,
    timeout: Duration,
    auditor: Option<Arc<dyn Auditor>>,
    token: Token,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            http_client: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            auditor: Some(Arc::new(LogAuditor)),
            token: Token::default(),
        }
    }
}

impl ClientBuilder {
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Uses `client` as transport, either a plain `reqwest::Client` or one
    /// wrapped with middleware. The configured timeout is then ignored.
    pub fn with_http_client(mut self, client: impl Into<ClientWithMiddleware>) -> Self {
        self.http_client = Some(client.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auditor(mut self, auditor: impl Auditor + 'static) -> Self {
        self.auditor = Some(Arc::new(auditor));
        self
    }

    pub fn without_auditor(mut self) -> Self {
        self.auditor = None;
        self
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.token = token;
        self
    }

    pub fn build(self) -> Result<NordigenClient> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL).map_err(HttpError::from)?,
        };

        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(HttpError::from)?
                .into(),
        };

        Ok(NordigenClient {
            base_url,
            http_client,
            auditor: self.auditor,
            token: self.token,
        })
    }
}
