//! Nordigen resources: tokens, institutions, requisitions and transactions.
//!
//! Each submodule holds the request/response shapes of one resource and the
//! [`crate::NordigenClient`] methods that call it.

mod institutions;
mod requisitions;
mod token;
mod transactions;

use thiserror::Error;

pub use institutions::Institution;
pub use requisitions::{Requisition, RequisitionOptions};
pub use token::{AccessToken, Token};
pub use transactions::{Transaction, Transactions};

/// A response field that is present but cannot be decoded.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp { value: String, source: chrono::ParseError },

    #[error("invalid date {value:?}: {source}")]
    Date { value: String, source: chrono::ParseError },

    #[error("invalid url {value:?}: {source}")]
    Url { value: String, source: url::ParseError },

    #[error("invalid amount {value:?}: {source}")]
    Amount {
        value: String,
        source: std::num::ParseFloatError,
    },
}
