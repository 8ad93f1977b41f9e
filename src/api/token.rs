use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::NordigenClient;
use crate::error::Result;
use crate::log::mask_secret;

/// Access and refresh tokens, with their lifetimes in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access: String,
    pub access_expires: i64,
    pub refresh: String,
    pub refresh_expires: i64,
}

/// A new access token obtained from a refresh token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access: String,
    pub access_expires: i64,
}

#[derive(Serialize)]
struct NewTokenRequest<'a> {
    secret_id: &'a str,
    secret_key: &'a str,
}

#[derive(Serialize)]
struct RefreshTokenRequest<'a> {
    refresh: &'a str,
}

impl NordigenClient {
    /// Issues a token pair for the API credentials.
    ///
    /// Blank credentials are rejected by the provider with a field-level
    /// error, which is returned as [`crate::Error::Provider`].
    pub async fn new_token(&self, secret_id: &str, secret_key: &str) -> Result<Token> {
        debug!(secret_id = &*mask_secret(secret_id); "Requesting new token");

        let token: Token = self
            .request()
            .with_operation("Create.Token")
            .with_json_body(&NewTokenRequest { secret_id, secret_key })
            .post("/api/v2/token/new/")
            .await?;

        info!(
            access_expires = token.access_expires,
            refresh_expires = token.refresh_expires;
            "New token issued"
        );
        Ok(token)
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh_token(&self, refresh: &str) -> Result<AccessToken> {
        let token: AccessToken = self
            .request()
            .with_operation("Refresh.Token")
            .with_json_body(&RefreshTokenRequest { refresh })
            .post("/api/v2/token/refresh/")
            .await?;

        info!(access_expires = token.access_expires; "Access token refreshed");
        Ok(token)
    }
}
