//! Request helper for the booth API.
//!
//! # Design
//! `ApiClient` holds an immutable `ApiConfig`, an `AdminKeySource` and a
//! `Transport`, and carries no mutable state between calls. Every request is
//! split into `build_request`, which produces an `HttpRequest`, and
//! `parse_response`, which consumes an `HttpResponse`. `request` and the
//! `get`/`post`/`put` shorthands join the two through the transport; callers
//! that do their own I/O can use the halves directly.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::storage::{AdminKeySource, NoAdminKey};
use crate::transport::{Transport, UreqTransport};
use crate::url::join_url;

pub const ACCEPT: &str = "accept";
pub const CONTENT_TYPE: &str = "content-type";
pub const CACHE_CONTROL: &str = "cache-control";
pub const JSON: &str = "application/json";

/// Header that makes the tunneling proxy skip its browser warning page.
pub const TUNNEL_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Debug, Clone)]
pub struct ApiClient<K = NoAdminKey, T = UreqTransport> {
    config: ApiConfig,
    admin_key: K,
    transport: T,
}

impl ApiClient {
    /// Client without an admin key, talking over `ureq`.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            admin_key: NoAdminKey,
            transport: UreqTransport::new(),
        }
    }
}

impl<K, T> ApiClient<K, T> {
    pub fn with_admin_key<S: AdminKeySource>(self, admin_key: S) -> ApiClient<S, T> {
        ApiClient {
            config: self.config,
            admin_key,
            transport: self.transport,
        }
    }

    pub fn with_transport<U: Transport>(self, transport: U) -> ApiClient<K, U> {
        ApiClient {
            config: self.config,
            admin_key: self.admin_key,
            transport,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Turn a response into the parsed JSON body.
    ///
    /// Non-2xx statuses become `ApiError::Http`, an empty body is `None`,
    /// anything else must be valid JSON.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Option<Value>, ApiError> {
        check_status(&response)?;
        if response.body.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&response.body)
            .map(Some)
            .map_err(|_| ApiError::parse(&response.body))
    }

    /// Like `parse_response`, but deserializes into `R`.
    pub fn parse_response_as<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<R, ApiError> {
        check_status(&response)?;
        if response.body.is_empty() {
            return Err(ApiError::EmptyBody);
        }
        serde_json::from_str(&response.body).map_err(|_| ApiError::parse(&response.body))
    }
}

impl<K: AdminKeySource, T> ApiClient<K, T> {
    /// Describe a request without sending it.
    ///
    /// `body` is dropped for GET. For POST and PUT a missing or `null` body
    /// is sent as `{}`.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpRequest, ApiError> {
        let url = join_url(self.config.base_url(), path)?;

        let mut headers = vec![
            (ACCEPT.to_string(), JSON.to_string()),
            (TUNNEL_BYPASS_HEADER.to_string(), "1".to_string()),
            (CACHE_CONTROL.to_string(), "no-cache".to_string()),
        ];
        if let Some(key) = self.current_admin_key() {
            headers.push((ADMIN_KEY_HEADER.to_string(), key));
        }

        let payload = if method.has_body() {
            headers.push((CONTENT_TYPE.to_string(), JSON.to_string()));
            let payload = match body {
                Some(value) if !value.is_null() => serde_json::to_string(value)?,
                _ => "{}".to_string(),
            };
            Some(payload)
        } else {
            None
        };

        // Logs what the caller passed, even when GET drops it from the wire.
        debug!(%method, %url, body = %log_body(body), "api request");

        Ok(HttpRequest {
            method,
            url,
            headers,
            body: payload,
        })
    }

    fn current_admin_key(&self) -> Option<String> {
        self.admin_key
            .admin_key()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

impl<K: AdminKeySource, T: Transport> ApiClient<K, T> {
    /// Perform one request and normalize the outcome.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        let response = self.send(method, path, body)?;
        self.parse_response(response)
    }

    /// Perform one request and deserialize a non-empty JSON body into `R`.
    pub fn request_as<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<R, ApiError> {
        let response = self.send(method, path, body)?;
        self.parse_response_as(response)
    }

    pub fn get(&self, path: &str) -> Result<Option<Value>, ApiError> {
        self.request(HttpMethod::Get, path, None)
    }

    pub fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Option<Value>, ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(HttpMethod::Post, path, Some(&body))
    }

    pub fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Option<Value>, ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(HttpMethod::Put, path, Some(&body))
    }

    fn send(&self, method: HttpMethod, path: &str, body: Option<&Value>) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(method, path, body)?;
        self.transport.execute(&request).map_err(ApiError::Transport)
    }
}

fn log_body(body: Option<&Value>) -> String {
    body.map_or_else(|| "null".to_string(), Value::to_string)
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        status_text: response.status_text.clone(),
        detail: error_detail(&response.body),
    })
}

/// Best-effort message from an error body: its `error` field, else the whole
/// JSON document, else the raw text.
fn error_detail(text: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(text) else {
        return text.to_string();
    };
    match json.get("error") {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        Some(other) if is_truthy(other) => other.to_string(),
        _ => json.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::error::BoxError;
    use crate::storage::StaticAdminKey;

    const BASE: &str = "https://x.com/api/v1";

    /// Records every request and replies with a canned response.
    struct Recorder {
        requests: Mutex<Vec<HttpRequest>>,
        reply: HttpResponse,
    }

    impl Recorder {
        fn replying(status: u16, status_text: &str, body: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: HttpResponse {
                    status,
                    status_text: status_text.to_string(),
                    headers: Vec::new(),
                    body: body.to_string(),
                },
            }
        }

        fn sent(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for Recorder {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, BoxError> {
            Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }
    }

    fn client(recorder: &Recorder) -> ApiClient<NoAdminKey, &Recorder> {
        ApiClient::new(ApiConfig::new(BASE)).with_transport(recorder)
    }

    fn response(status: u16, status_text: &str, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            status_text: status_text.to_string(),
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn get_builds_plain_request() {
        let recorder = Recorder::replying(200, "OK", "[]");
        let value = client(&recorder).get("/users").unwrap();
        assert_eq!(value, Some(json!([])));

        let sent = recorder.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].url, "https://x.com/api/v1/users");
        assert!(sent[0].body.is_none());
        assert_eq!(sent[0].header("accept"), Some("application/json"));
        assert_eq!(sent[0].header(TUNNEL_BYPASS_HEADER), Some("1"));
        assert_eq!(sent[0].header("cache-control"), Some("no-cache"));
        assert_eq!(sent[0].header("content-type"), None);
    }

    #[test]
    fn get_ignores_body_argument() {
        let recorder = Recorder::replying(200, "OK", "{}");
        let body = json!({"ignored": true});
        client(&recorder)
            .request(HttpMethod::Get, "/booths", Some(&body))
            .unwrap();
        assert!(recorder.sent()[0].body.is_none());
    }

    #[test]
    fn log_body_reports_caller_argument() {
        let body = json!({"ignored": true});
        assert_eq!(log_body(Some(&body)), r#"{"ignored":true}"#);
        assert_eq!(log_body(Some(&Value::Null)), "null");
        assert_eq!(log_body(None), "null");

        let req = ApiClient::new(ApiConfig::new(BASE))
            .build_request(HttpMethod::Get, "/booths", Some(&body))
            .unwrap();
        assert!(req.body.is_none());
    }

    #[test]
    fn non_get_without_body_sends_empty_object() {
        let c = ApiClient::new(ApiConfig::new(BASE));
        for method in [HttpMethod::Post, HttpMethod::Put] {
            let req = c.build_request(method, "orders", None).unwrap();
            assert_eq!(req.body.as_deref(), Some("{}"));
            assert_eq!(req.header("content-type"), Some("application/json"));

            let req = c.build_request(method, "orders", Some(&Value::Null)).unwrap();
            assert_eq!(req.body.as_deref(), Some("{}"));
        }
    }

    #[test]
    fn post_serializes_body() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Status<'a> {
            booth_id: &'a str,
            is_open: bool,
        }

        let recorder = Recorder::replying(200, "OK", r#"{"ok":true}"#);
        let value = client(&recorder)
            .post("/admin/booths/status", &Status { booth_id: "b1", is_open: false })
            .unwrap();
        assert_eq!(value, Some(json!({"ok": true})));

        let sent = recorder.sent();
        assert_eq!(sent[0].method, HttpMethod::Post);
        let body: Value = serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"boothId": "b1", "isOpen": false}));
    }

    #[test]
    fn put_with_unit_body_sends_empty_object() {
        let recorder = Recorder::replying(204, "No Content", "");
        assert_eq!(client(&recorder).put("/things/1", &()).unwrap(), None);
        assert_eq!(recorder.sent()[0].method, HttpMethod::Put);
        assert_eq!(recorder.sent()[0].body.as_deref(), Some("{}"));
    }

    #[test]
    fn admin_key_is_trimmed_and_attached() {
        let c = ApiClient::new(ApiConfig::new(BASE)).with_admin_key(StaticAdminKey("  secret \n".to_string()));
        let req = c.build_request(HttpMethod::Get, "/admin/whoami", None).unwrap();
        assert_eq!(req.header(ADMIN_KEY_HEADER), Some("secret"));
    }

    #[test]
    fn blank_admin_key_is_omitted() {
        for key in ["", "   ", "\t\n"] {
            let c = ApiClient::new(ApiConfig::new(BASE)).with_admin_key(StaticAdminKey(key.to_string()));
            let req = c.build_request(HttpMethod::Post, "/admin/menus", None).unwrap();
            assert_eq!(req.header(ADMIN_KEY_HEADER), None, "{key:?}");
        }
        let req = ApiClient::new(ApiConfig::new(BASE))
            .build_request(HttpMethod::Get, "/booths", None)
            .unwrap();
        assert_eq!(req.header(ADMIN_KEY_HEADER), None);
    }

    #[test]
    fn unset_base_url_fails_before_transport() {
        let recorder = Recorder::replying(200, "OK", "{}");
        let c = ApiClient::new(ApiConfig::default()).with_transport(&recorder);
        assert!(matches!(c.get("/booths"), Err(ApiError::Config(_))));
        assert!(matches!(c.post("/orders", &json!({})), Err(ApiError::Config(_))));
        assert!(matches!(c.put("/orders", &json!({})), Err(ApiError::Config(_))));
        assert!(recorder.sent().is_empty());
    }

    #[test]
    fn transport_failure_is_propagated() {
        let c = ApiClient::new(ApiConfig::new(BASE)).with_transport(Unreachable);
        let err = c.get("/booths").unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn http_error_uses_error_field() {
        let c = ApiClient::new(ApiConfig::new(BASE));
        let err = c
            .parse_response(response(404, "Not Found", r#"{"error":"not found"}"#))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("HTTP 404"), "{message}");
        assert!(message.contains("not found"), "{message}");
        assert_eq!(message, "HTTP 404 Not Found\nnot found");
    }

    #[test]
    fn http_error_without_error_field_uses_json_text() {
        let c = ApiClient::new(ApiConfig::new(BASE));
        let err = c
            .parse_response(response(400, "Bad Request", r#"{ "code": "BAD" }"#))
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Http { status: 400, ref detail, .. } if detail == r#"{"code":"BAD"}"#
        ));

        let err = c
            .parse_response(response(409, "Conflict", r#"{"error":"","code":"X"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { ref detail, .. } if detail.contains("\"code\"")));
    }

    #[test]
    fn http_error_with_plain_text_body_uses_raw_text() {
        let c = ApiClient::new(ApiConfig::new(BASE));
        let err = c
            .parse_response(response(502, "Bad Gateway", "<html>upstream down</html>"))
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway\n<html>upstream down</html>");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn empty_success_body_is_none() {
        let c = ApiClient::new(ApiConfig::new(BASE));
        assert_eq!(c.parse_response(response(200, "OK", "")).unwrap(), None);
    }

    #[test]
    fn malformed_success_body_reports_preview() {
        let c = ApiClient::new(ApiConfig::new(BASE));
        let err = c.parse_response(response(200, "OK", "not-json{{{")).unwrap_err();
        assert!(err.to_string().contains("not-json{{{"));

        let long = format!("<{}", "x".repeat(500));
        let err = c.parse_response(response(200, "OK", &long)).unwrap_err();
        let ApiError::Parse { preview } = err else {
            panic!("expected parse error");
        };
        assert_eq!(preview.len(), 200);
        assert!(long.starts_with(&preview));
    }

    #[test]
    fn json_null_body_parses_to_null_value() {
        let c = ApiClient::new(ApiConfig::new(BASE));
        assert_eq!(c.parse_response(response(200, "OK", "null")).unwrap(), Some(Value::Null));
    }

    #[test]
    fn typed_request_deserializes_body() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Created {
            ok: bool,
            id: u64,
        }

        let recorder = Recorder::replying(201, "Created", r#"{"ok":true,"id":7,"total":3000}"#);
        let created: Created = client(&recorder)
            .request_as(HttpMethod::Post, "/orders", None)
            .unwrap();
        assert_eq!(created, Created { ok: true, id: 7 });

        let c = ApiClient::new(ApiConfig::new(BASE));
        let err = c.parse_response_as::<Created>(response(200, "OK", "")).unwrap_err();
        assert!(matches!(err, ApiError::EmptyBody));
        let err = c.parse_response_as::<Created>(response(200, "OK", r#"{"ok":1}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Parse { .. }));
    }
}
