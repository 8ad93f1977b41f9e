//! HTTP plumbing for the Nordigen API.
//!
//! Every resource method goes through a [`RequestBuilder`]: it collects
//! headers, query parameters, a JSON body and an [`Authorization`], sends
//! one request through a `reqwest` (middleware) client, and decodes either
//! the typed result or the provider's error body.
//!
//! # Architecture
//!
//! - [`RequestBuilder`] - one-shot request construction and decoding
//! - [`Authorization`] / [`BearerAuthorization`] - credential injection
//! - [`Auditor`] / [`LogAuditor`] / [`NoopAuditor`] - request/response auditing
//! - [`HttpError`] - transport, encoding and status failures
//!
//! # Error Handling
//!
//! The builder reports non-2xx answers as [`HttpError::Status`]. The
//! conversion into [`crate::Error`] is where provider errors are mapped to
//! the invalid-token, rate-limit and not-found sentinels.

mod auditor;
mod auth;
mod error;
mod request;

pub use auditor::{AuditedResponse, Auditor, LogAuditor, NoopAuditor};
pub use auth::{Authorization, BearerAuthorization};
pub use error::HttpError;
pub use request::{QueryValue, RequestBuilder};
