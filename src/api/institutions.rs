use log::debug;
use serde::{Deserialize, Serialize};

use super::Token;
use crate::NordigenClient;
use crate::error::Result;

/// A bank reachable through the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Institution {
    pub id: String,
    pub name: String,
    pub bic: String,
    /// How many days of history the institution exposes, as sent by the provider.
    pub transaction_total_days: String,
    pub countries: Vec<String>,
    #[serde(rename = "logo")]
    pub logo_url: String,
}

impl NordigenClient {
    /// Lists the institutions available in `country` (ISO 3166 alpha-2).
    pub async fn list_institutions(&self, token: &Token, country: &str) -> Result<Vec<Institution>> {
        let institutions: Vec<Institution> = self
            .authorized(token, "Read.Institutions")
            .with_query_param("country", country)
            .get("/api/v2/institutions/")
            .await?;

        debug!(country = country, count = institutions.len(); "Institutions listed");
        Ok(institutions)
    }
}
