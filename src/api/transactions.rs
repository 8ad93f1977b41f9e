use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{FieldError, Token};
use crate::NordigenClient;
use crate::error::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One account movement.
///
/// Amounts are signed: debits are negative. Text fields the institution
/// does not provide are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransaction")]
pub struct Transaction {
    pub id: String,
    pub booking_date: Option<NaiveDate>,
    pub value_date: Option<NaiveDate>,
    pub amount: f64,
    pub currency: String,
    pub additional_information: String,
    pub creditor_id: String,
    pub creditor_name: String,
    pub debtor_id: String,
    pub debtor_name: String,
    pub remittance_information: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    internal_transaction_id: Option<String>,
    booking_date: Option<String>,
    value_date: Option<String>,
    transaction_amount: RawAmount,
    additional_information: Option<String>,
    creditor_id: Option<String>,
    creditor_name: Option<String>,
    debtor_id: Option<String>,
    debtor_name: Option<String>,
    remittance_information_unstructured: Option<String>,
}

#[derive(Deserialize)]
struct RawAmount {
    amount: String,
    #[serde(default)]
    currency: Option<String>,
}

fn parse_date(value: Option<String>) -> std::result::Result<Option<NaiveDate>, FieldError> {
    value
        .map(|value| NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|source| FieldError::Date { value, source }))
        .transpose()
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = FieldError;

    fn try_from(raw: RawTransaction) -> std::result::Result<Self, Self::Error> {
        let amount = raw
            .transaction_amount
            .amount
            .trim()
            .parse::<f64>()
            .map_err(|source| FieldError::Amount {
                value: raw.transaction_amount.amount.clone(),
                source,
            })?;

        Ok(Transaction {
            id: raw.internal_transaction_id.unwrap_or_default(),
            booking_date: parse_date(raw.booking_date)?,
            value_date: parse_date(raw.value_date)?,
            amount,
            currency: raw.transaction_amount.currency.unwrap_or_default(),
            additional_information: raw.additional_information.unwrap_or_default(),
            creditor_id: raw.creditor_id.unwrap_or_default(),
            creditor_name: raw.creditor_name.unwrap_or_default(),
            debtor_id: raw.debtor_id.unwrap_or_default(),
            debtor_name: raw.debtor_name.unwrap_or_default(),
            remittance_information: raw.remittance_information_unstructured.unwrap_or_default(),
        })
    }
}

/// Booked and pending transactions of an account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transactions {
    pub booked: Vec<Transaction>,
    pub pending: Vec<Transaction>,
}

#[derive(Deserialize)]
struct TransactionsResponse {
    transactions: Transactions,
}

impl NordigenClient {
    /// Fetches the booked and pending transactions of `account_id`.
    pub async fn get_transactions(&self, token: &Token, account_id: &str) -> Result<Transactions> {
        let response: TransactionsResponse = self
            .authorized(token, "Read.Transactions")
            .get(&format!("/api/v2/accounts/{}/transactions/", account_id))
            .await?;

        debug!(
            account_id = account_id,
            booked = response.transactions.booked.len(),
            pending = response.transactions.pending.len();
            "Transactions fetched"
        );
        Ok(response.transactions)
    }

    /// Fetches only the booked transactions of `account_id`.
    pub async fn get_booked_transactions(&self, token: &Token, account_id: &str) -> Result<Vec<Transaction>> {
        Ok(self.get_transactions(token, account_id).await?.booked)
    }
}
