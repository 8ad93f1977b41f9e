use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{FieldError, Token};
use crate::NordigenClient;
use crate::error::Result;

/// Optional settings sent when creating a requisition.
///
/// Unset fields are left out of the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequisitionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub account_selection: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub redirect_immediate: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Serialize)]
struct CreateRequisitionRequest<'a> {
    redirect: &'a str,
    institution_id: &'a str,
    #[serde(flatten)]
    options: &'a RequisitionOptions,
}

/// A consent linking an end user's accounts at one institution.
///
/// The end user completes the consent by visiting `link`; afterwards
/// `accounts` lists the account IDs that can be queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRequisition")]
pub struct Requisition {
    pub id: String,
    pub created: DateTime<Utc>,
    pub status: String,
    pub accounts: Vec<String>,
    pub link: Url,
    pub redirect: String,
    pub institution_id: String,
    #[serde(flatten)]
    pub options: RequisitionOptions,
}

#[derive(Deserialize)]
struct RawRequisition {
    id: String,
    created: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    accounts: Option<Vec<String>>,
    link: String,
    #[serde(default)]
    redirect: Option<String>,
    #[serde(default)]
    institution_id: Option<String>,
    #[serde(flatten)]
    options: RequisitionOptions,
}

impl TryFrom<RawRequisition> for Requisition {
    type Error = FieldError;

    fn try_from(raw: RawRequisition) -> std::result::Result<Self, Self::Error> {
        let created = DateTime::parse_from_rfc3339(&raw.created)
            .map_err(|source| FieldError::Timestamp {
                value: raw.created.clone(),
                source,
            })?
            .with_timezone(&Utc);
        let link = Url::parse(&raw.link).map_err(|source| FieldError::Url {
            value: raw.link.clone(),
            source,
        })?;

        Ok(Requisition {
            id: raw.id,
            created,
            status: raw.status.unwrap_or_default(),
            accounts: raw.accounts.unwrap_or_default(),
            link,
            redirect: raw.redirect.unwrap_or_default(),
            institution_id: raw.institution_id.unwrap_or_default(),
            options: raw.options,
        })
    }
}

impl NordigenClient {
    /// Creates a requisition for `institution_id`.
    ///
    /// The end user is sent back to `redirect` once they have gone through
    /// the consent flow at [`Requisition::link`].
    pub async fn create_requisition(
        &self,
        token: &Token,
        redirect: &Url,
        institution_id: &str,
        options: Option<&RequisitionOptions>,
    ) -> Result<Requisition> {
        let default_options = RequisitionOptions::default();
        let body = CreateRequisitionRequest {
            redirect: redirect.as_str(),
            institution_id,
            options: options.unwrap_or(&default_options),
        };

        let requisition: Requisition = self
            .authorized(token, "Create.Requisition")
            .with_json_body(&body)
            .post("/api/v2/requisitions/")
            .await?;

        info!(
            requisition_id = &*requisition.id,
            institution_id = institution_id;
            "Requisition created"
        );
        Ok(requisition)
    }

    pub async fn get_requisition(&self, token: &Token, requisition_id: &str) -> Result<Requisition> {
        let requisition: Requisition = self
            .authorized(token, "Read.Requisition")
            .get(&format!("/api/v2/requisitions/{}", requisition_id))
            .await?;

        debug!(
            requisition_id = requisition_id,
            status = &*requisition.status,
            accounts = requisition.accounts.len();
            "Requisition fetched"
        );
        Ok(requisition)
    }

    /// Deletes a requisition together with its end user agreement.
    ///
    /// Returns the provider's confirmation body.
    pub async fn delete_requisition(&self, token: &Token, requisition_id: &str) -> Result<serde_json::Value> {
        let confirmation = self
            .authorized(token, "Delete.Requisition")
            .delete(&format!("/api/v2/requisitions/{}/", requisition_id))
            .await?;

        info!(requisition_id = requisition_id; "Requisition deleted");
        Ok(confirmation)
    }
}
