//! Client for the Nordigen open-banking API.
//!
//! Issue tokens, list institutions, create requisitions (end user consents)
//! and read account transactions. Every call is a single round trip built
//! by [`http::RequestBuilder`]; provider errors come back as [`Error`],
//! with invalid tokens, rate limits and missing resources mapped to
//! dedicated variants.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod log;

pub use crate::api::{AccessToken, Institution, Requisition, RequisitionOptions, Token, Transaction, Transactions};
pub use crate::client::{ClientBuilder, NordigenClient};
pub use crate::error::{Error, ProviderError, Result};
