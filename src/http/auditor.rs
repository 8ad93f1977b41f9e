//! Request/response auditing.
//!
//! An [`Auditor`] sees every request right before it goes on the wire and
//! the matching response once its body has been read. Both calls share the
//! ID returned by [`Auditor::id`], so a request and its response can be
//! paired in the logs.

use log::debug;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde_json::Value;
use uuid::Uuid;

use crate::log::mask_secret;

/// JSON fields whose values never reach the audit log in clear text.
const SECRET_FIELDS: &[&str] = &["secret_id", "secret_key", "access", "refresh", "ssn"];

/// A fully read response, as handed to [`Auditor::response`].
#[derive(Debug)]
pub struct AuditedResponse<'a> {
    pub status: StatusCode,
    pub headers: &'a HeaderMap,
    pub body: &'a [u8],
}

/// Observes outgoing requests and incoming responses.
pub trait Auditor: Send + Sync {
    /// Returns a new request ID.
    fn id(&self) -> String;

    /// Audits the request about to be sent.
    fn request(&self, id: &str, request: &reqwest::Request);

    /// Audits the response received for request `id`.
    fn response(&self, id: &str, response: &AuditedResponse<'_>);
}

/// Writes requests and responses to the `audit` log target at debug level.
///
/// Bearer tokens and credential fields in JSON bodies are masked unless
/// `NORDIGEN_REVEAL_SECRETS` is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAuditor;

impl Auditor for LogAuditor {
    fn id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn request(&self, id: &str, request: &reqwest::Request) {
        let headers = format_headers(request.headers());
        let body = request
            .body()
            .and_then(|body| body.as_bytes())
            .map(redact_body)
            .unwrap_or_default();

        debug!(
            target: "audit",
            request_id = id,
            method:% = request.method(),
            url:% = request.url(),
            headers = &*headers,
            body = &*body;
            "HTTP request"
        );
    }

    fn response(&self, id: &str, response: &AuditedResponse<'_>) {
        let headers = format_headers(response.headers);
        let body = redact_body(response.body);

        debug!(
            target: "audit",
            request_id = id,
            status = response.status.as_u16(),
            headers = &*headers,
            body = &*body;
            "HTTP response"
        );
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditor;

impl Auditor for NoopAuditor {
    fn id(&self) -> String {
        String::new()
    }

    fn request(&self, _id: &str, _request: &reqwest::Request) {}

    fn response(&self, _id: &str, _response: &AuditedResponse<'_>) {}
}

fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<binary>");
            if name == AUTHORIZATION {
                match value.split_once(' ') {
                    Some((scheme, credentials)) => format!("{}: {} {}", name, scheme, mask_secret(credentials)),
                    None => format!("{}: {}", name, mask_secret(value)),
                }
            } else {
                format!("{}: {}", name, value)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders a body for the audit log with credential fields masked.
pub(crate) fn redact_body(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut value) => {
            redact_value(&mut value);
            value.to_string()
        },
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(fields) => {
            for (key, field) in fields.iter_mut() {
                match field {
                    Value::String(text) if SECRET_FIELDS.contains(&key.as_str()) => {
                        *text = mask_secret(text);
                    },
                    other => redact_value(other),
                }
            }
        },
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {},
    }
}
