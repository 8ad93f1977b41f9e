// One-shot request builder shared by every resource method.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::Method;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::{Url, form_urlencoded};

use super::auditor::{AuditedResponse, Auditor};
use super::auth::Authorization;
use super::error::HttpError;
use crate::error::ProviderError;

const JSON_CONTENT_TYPE: &str = "application/json";

/// A query parameter value.
///
/// Lists are sent comma separated and dates as `YYYY-MM-DD`.
/// [`Absent`](QueryValue::Absent) adds nothing to the query string, which
/// is what an optional parameter set to `None` turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Int(i64),
    List(Vec<String>),
    Date(NaiveDate),
    Absent,
}

impl QueryValue {
    fn encode(self) -> Option<String> {
        match self {
            QueryValue::Text(text) => Some(text),
            QueryValue::Int(n) => Some(n.to_string()),
            QueryValue::List(items) => Some(items.join(",")),
            QueryValue::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
            QueryValue::Absent => None,
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(value: Vec<String>) -> Self {
        QueryValue::List(value)
    }
}

impl From<&[&str]> for QueryValue {
    fn from(value: &[&str]) -> Self {
        QueryValue::List(value.iter().map(|item| item.to_string()).collect())
    }
}

impl From<NaiveDate> for QueryValue {
    fn from(value: NaiveDate) -> Self {
        QueryValue::Date(value)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Absent, Into::into)
    }
}

fn encode_query_part(part: &str) -> String {
    form_urlencoded::byte_serialize(part.as_bytes())
        .collect::<String>()
        .replace("%2C", ",")
}

/// Builds and sends a single HTTP request.
///
/// A builder starts with `accept: application/json` and accumulates
/// headers, query parameters, an optional JSON body and an optional
/// [`Authorization`]. It is consumed by [`get`](Self::get),
/// [`post`](Self::post) or [`delete`](Self::delete), which resolve the path
/// against the base URL, send the request and decode the response.
///
/// Responses with a status of 300 or above come back as
/// [`HttpError::Status`]. On success the body is decoded into `T`; use
/// [`serde_json::Value`] when no typed result is wanted.
///
/// # Example
///
/// ```rust,no_run
/// use nordigen::http::{BearerAuthorization, RequestBuilder};
/// use url::Url;
///
/// # async fn example() -> Result<(), nordigen::http::HttpError> {
/// let base_url = Url::parse("https://ob.nordigen.com")?;
/// let institutions: serde_json::Value = RequestBuilder::new(base_url, reqwest::Client::new().into(), None)
///     .with_authorization(BearerAuthorization::new("access-token"))
///     .with_query_param("country", "PT")
///     .get("/api/v2/institutions/")
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct RequestBuilder {
    base_url: Url,
    client: ClientWithMiddleware,
    auditor: Option<Arc<dyn Auditor>>,
    auth: Option<Box<dyn Authorization>>,
    headers: BTreeMap<String, String>,
    query_params: Vec<(String, String)>,
    body: Option<Result<Vec<u8>, serde_json::Error>>,
    operation: Option<String>,
}

impl RequestBuilder {
    pub fn new(base_url: Url, client: ClientWithMiddleware, auditor: Option<Arc<dyn Auditor>>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("accept".to_string(), JSON_CONTENT_TYPE.to_string());

        Self {
            base_url,
            client,
            auditor,
            auth: None,
            headers,
            query_params: Vec::new(),
            body: None,
            operation: None,
        }
    }

    pub fn with_authorization(mut self, auth: impl Authorization + 'static) -> Self {
        self.auth = Some(Box::new(auth));
        self
    }

    /// Sets a header. Empty values are ignored; header names are case-insensitive.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.headers.insert(key.to_ascii_lowercase(), value.to_string());
        }
        self
    }

    /// Sets several headers, keeping the first value of multi-valued entries.
    pub fn with_headers<K, V, I>(mut self, headers: impl IntoIterator<Item = (K, I)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = V>,
    {
        for (key, values) in headers {
            if let Some(value) = values.into_iter().next() {
                self.headers
                    .insert(key.as_ref().to_ascii_lowercase(), value.as_ref().to_string());
            }
        }
        self
    }

    /// Serializes `body` as the JSON payload of a POST request.
    pub fn with_json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.body = Some(serde_json::to_vec(body));
        self.headers
            .insert(CONTENT_TYPE.as_str().to_string(), JSON_CONTENT_TYPE.to_string());
        self
    }

    pub fn with_query_param(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        if let Some(value) = value.into().encode() {
            self.query_params.push((key.to_string(), value));
        }
        self
    }

    /// Labels the request for logs, e.g. `Read.Institutions`.
    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub async fn get<T: DeserializeOwned>(self, path: &str) -> Result<T, HttpError> {
        self.send(Method::GET, path).await
    }

    pub async fn post<T: DeserializeOwned>(self, path: &str) -> Result<T, HttpError> {
        self.send(Method::POST, path).await
    }

    pub async fn delete<T: DeserializeOwned>(self, path: &str) -> Result<T, HttpError> {
        self.send(Method::DELETE, path).await
    }

    /// Resolves `path` against the base URL and writes the query string.
    ///
    /// Keys are sorted, values of a repeated key keep their insertion
    /// order. Keys and values are form-encoded, except that commas are left
    /// unescaped.
    fn resolve(&self, path: &str) -> Result<Url, HttpError> {
        let mut url = self.base_url.join(path)?;

        if !self.query_params.is_empty() {
            let mut params: Vec<&(String, String)> = self.query_params.iter().collect();
            params.sort_by(|a, b| a.0.cmp(&b.0));

            let query = params
                .iter()
                .map(|(key, value)| format!("{}={}", encode_query_part(key), encode_query_part(value)))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }

        Ok(url)
    }

    fn build(&mut self, method: Method, path: &str) -> Result<reqwest::Request, HttpError> {
        let url = self.resolve(path)?;
        let mut request = reqwest::Request::new(method.clone(), url);

        let headers = request.headers_mut();
        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| HttpError::InvalidHeader(format!("{key}: {e}")))?;
            let value = HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader(format!("{key}: {e}")))?;
            headers.insert(name, value);
        }

        if method == Method::POST {
            if let Some(body) = self.body.take() {
                let body = body?;
                if !body.is_empty() {
                    request.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
                }
                *request.body_mut() = Some(body.into());
            }
        }

        match &self.auth {
            Some(auth) => auth.authorize(request),
            None => Ok(request),
        }
    }

    async fn send<T: DeserializeOwned>(mut self, method: Method, path: &str) -> Result<T, HttpError> {
        let request = self.build(method, path)?;
        let operation = self.operation.as_deref().unwrap_or("-");
        debug!(
            operation = operation,
            method:% = request.method(),
            url:% = request.url();
            "HTTP: Sending request"
        );

        let request_id = self.auditor.as_ref().map(|auditor| {
            let id = auditor.id();
            auditor.request(&id, &request);
            id
        });

        let response = self.client.execute(request).await?;
        let status = response.status();
        let headers: HeaderMap = response.headers().clone();
        let body = response.bytes().await?;

        if let (Some(auditor), Some(id)) = (&self.auditor, &request_id) {
            auditor.response(
                id,
                &AuditedResponse {
                    status,
                    headers: &headers,
                    body: &body,
                },
            );
        }

        if status.as_u16() >= 300 {
            let error = ProviderError::from_response(status, &body);
            warn!(
                operation = operation,
                status = status.as_u16(),
                error:% = error;
                "HTTP: Provider returned an error"
            );
            return Err(HttpError::Status(error));
        }

        debug!(operation = operation, status = status.as_u16(); "HTTP: Request succeeded");

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::BearerAuthorization;

    #[derive(Default)]
    struct RecordingAuditor {
        events: Mutex<Vec<String>>,
    }

    impl Auditor for RecordingAuditor {
        fn id(&self) -> String {
            "req-1".to_string()
        }

        fn request(&self, id: &str, request: &reqwest::Request) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{} request {} {}", id, request.method(), request.url().path()));
        }

        fn response(&self, id: &str, response: &AuditedResponse<'_>) {
            self.events.lock().unwrap().push(format!(
                "{} response {} {}",
                id,
                response.status.as_u16(),
                String::from_utf8_lossy(response.body)
            ));
        }
    }

    fn builder(server: &MockServer) -> RequestBuilder {
        RequestBuilder::new(server.uri().parse().unwrap(), reqwest::Client::new().into(), None)
    }

    #[test]
    fn test_query_values_encode() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(QueryValue::from(date).encode().as_deref(), Some("2024-03-09"));
        assert_eq!(QueryValue::from(42).encode().as_deref(), Some("42"));
        assert_eq!(QueryValue::from(&["a", "b"][..]).encode().as_deref(), Some("a,b"));
        assert_eq!(QueryValue::from(Vec::<String>::new()).encode().as_deref(), Some(""));
        assert_eq!(QueryValue::from("").encode().as_deref(), Some(""));
        assert_eq!(QueryValue::from(None::<NaiveDate>).encode(), None);
        assert_eq!(QueryValue::from(None::<Vec<String>>).encode(), None);
    }

    #[test]
    fn test_resolve_sorts_keys_and_keeps_commas() {
        let builder = RequestBuilder::new(
            "https://ob.nordigen.com/".parse().unwrap(),
            reqwest::Client::new().into(),
            None,
        )
        .with_query_param("status", "ok")
        .with_query_param("fields", vec!["id".to_string(), "name".to_string()])
        .with_query_param("country", "PT")
        .with_query_param("fields", "logo")
        .with_query_param("date_from", None::<NaiveDate>);

        let url = builder.resolve("/api/v2/institutions/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://ob.nordigen.com/api/v2/institutions/?country=PT&fields=id,name&fields=logo&status=ok"
        );
    }

    #[test]
    fn test_resolve_escapes_reserved_characters() {
        let builder = RequestBuilder::new(
            "https://ob.nordigen.com/".parse().unwrap(),
            reqwest::Client::new().into(),
            None,
        )
        .with_query_param("reference", "a&b=c")
        .with_query_param("amount", "1+1")
        .with_query_param("note", "50% off")
        .with_query_param("ids", vec!["x".to_string(), "y".to_string()]);

        let url = builder.resolve("/api/v2/requisitions/").unwrap();
        assert_eq!(url.query(), Some("amount=1%2B1&ids=x,y&note=50%25+off&reference=a%26b%3Dc"));
    }

    #[tokio::test]
    async fn test_server_receives_query_values_intact() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/requisitions/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let _: Value = builder(&server)
            .with_query_param("reference", "a&b=c")
            .with_query_param("amount", "1+1")
            .with_query_param("ids", vec!["x".to_string(), "y".to_string()])
            .get("/api/v2/requisitions/")
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let pairs: Vec<(String, String)> = requests[0].url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("amount".to_string(), "1+1".to_string()),
                ("ids".to_string(), "x,y".to_string()),
                ("reference".to_string(), "a&b=c".to_string()),
            ]
        );
    }

    #[test]
    fn test_resolve_relative_path() {
        let builder = RequestBuilder::new(
            "https://ob.nordigen.com/api/v2/".parse().unwrap(),
            reqwest::Client::new().into(),
            None,
        );
        assert_eq!(
            builder.resolve("requisitions/abc").unwrap().as_str(),
            "https://ob.nordigen.com/api/v2/requisitions/abc"
        );
        assert_eq!(
            builder.resolve("/api/v2/token/new/").unwrap().as_str(),
            "https://ob.nordigen.com/api/v2/token/new/"
        );
    }

    #[test]
    fn test_header_rules() {
        let builder = RequestBuilder::new(
            "https://ob.nordigen.com".parse().unwrap(),
            reqwest::Client::new().into(),
            None,
        )
        .with_header("X-Empty", "")
        .with_header("X-Trace", "one")
        .with_header("x-trace", "two")
        .with_headers(vec![("X-Multi", vec!["first", "second"]), ("X-None", vec![])]);

        assert_eq!(builder.headers.get("accept").map(String::as_str), Some("application/json"));
        assert_eq!(builder.headers.get("x-trace").map(String::as_str), Some("two"));
        assert_eq!(builder.headers.get("x-multi").map(String::as_str), Some("first"));
        assert!(!builder.headers.contains_key("x-empty"));
        assert!(!builder.headers.contains_key("x-none"));
    }

    #[tokio::test]
    async fn test_post_sends_json_body_and_headers() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/token/new/"))
            .and(header("accept", "application/json"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"secret_id": "id", "secret_key": "key"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a"})))
            .expect(1)
            .mount(&server)
            .await;

        let result: Value = builder(&server)
            .with_json_body(&json!({"secret_id": "id", "secret_key": "key"}))
            .post("/api/v2/token/new/")
            .await
            .unwrap();

        assert_eq!(result, json!({"access": "a"}));

        let requests = server.received_requests().await.unwrap();
        let expected_len = br#"{"secret_id":"id","secret_key":"key"}"#.len().to_string();
        assert_eq!(requests[0].headers.get("content-length").unwrap(), expected_len.as_str());
    }

    #[tokio::test]
    async fn test_get_does_not_send_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/institutions/"))
            .and(query_param("country", "PT"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let result: Vec<Value> = builder(&server)
            .with_authorization(BearerAuthorization::new("token"))
            .with_json_body(&json!({"ignored": true}))
            .with_query_param("country", "PT")
            .get("/api/v2/institutions/")
            .await
            .unwrap();

        assert!(result.is_empty());
        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_decoded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "summary": "Invalid token",
                "detail": "Token is invalid or expired",
                "status_code": 401
            })))
            .mount(&server)
            .await;

        let err = builder(&server).get::<Value>("/api/v2/institutions/").await.unwrap_err();
        match err {
            HttpError::Status(provider) => {
                assert_eq!(provider.http_status, 401);
                assert_eq!(provider.summary, "Invalid token");
                assert_eq!(provider.detail, "Token is invalid or expired");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_redirect_status_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(304))
            .mount(&server)
            .await;

        let err = builder(&server).get::<Value>("/").await.unwrap_err();
        assert!(matches!(err, HttpError::Status(ref p) if p.http_status == 304));
    }

    #[tokio::test]
    async fn test_typed_result_and_empty_body() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Item {
            id: String,
        }

        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/item"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x", "extra": 1})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/item"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let item: Item = builder(&server).get("/item").await.unwrap();
        assert_eq!(item, Item { id: "x".to_string() });

        let deleted: Option<Item> = builder(&server).delete("/item").await.unwrap();
        assert_eq!(deleted, None);

        let err = builder(&server).delete::<Item>("/item").await.unwrap_err();
        assert!(matches!(err, HttpError::Json(_)));
    }

    #[tokio::test]
    async fn test_auditor_pairs_request_and_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let auditor = Arc::new(RecordingAuditor::default());
        let _: Value = RequestBuilder::new(
            server.uri().parse().unwrap(),
            reqwest::Client::new().into(),
            Some(auditor.clone()),
        )
        .get("/audited")
        .await
        .unwrap();

        let events = auditor.events.lock().unwrap().clone();
        assert_eq!(events, vec!["req-1 request GET /audited", "req-1 response 200 {}"]);
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let err = RequestBuilder::new(
            "http://127.0.0.1:9".parse().unwrap(),
            reqwest::Client::new().into(),
            None,
        )
        .get::<Value>("/")
        .await
        .unwrap_err();

        assert!(matches!(err, HttpError::RequestFailed(_)));
    }
}
