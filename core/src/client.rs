//! Generic authenticated HTTP client for the todo API.
//!
//! # Design
//! `ApiClient` holds a `base_url`, an injected session store, and a ureq
//! agent. Each operation runs the same three stages:
//!
//! - `build_request` resolves the URL and attaches the bearer credential and
//!   JSON content type. Pure, no I/O.
//! - `execute` performs the round-trip. The agent is configured so 4xx/5xx
//!   come back as data; only transport-level failures become `Network`.
//! - `parse_response` interprets status and declared content type into a
//!   parsed value or one of the error kinds. Pure, no I/O.
//!
//! Splitting build/execute/parse keeps both pure stages testable with
//! hand-constructed values, which is where all the content-type edge cases
//! are pinned down.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::SessionStore;

/// Bodies quoted inside error values are cut to this many characters.
const BODY_SNIPPET_CHARS: usize = 200;

/// Environment variable naming the API base URL.
const BASE_URL_ENV: &str = "TODO_API_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Issues requests against the configured base URL with the session's bearer
/// token attached, and normalizes every outcome into `Result<_, ClientError>`.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    session: Arc<SessionStore>,
    agent: ureq::Agent,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            agent,
        }
    }

    /// Base URL from `TODO_API_URL`, falling back to the local development
    /// server.
    pub fn from_env(session: Arc<SessionStore>) -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url, session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(HttpMethod::Get, path, None)
    }

    pub fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.request(HttpMethod::Post, path, Some(to_json(body)?))
    }

    pub fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.request(HttpMethod::Put, path, Some(to_json(body)?))
    }

    pub fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.request(HttpMethod::Patch, path, Some(to_json(body)?))
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(HttpMethod::Delete, path, None)
    }

    fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<T, ClientError> {
        let request = self.build_request(method, path, body);
        let response = self.execute(request)?;
        let value = self.parse_response(response)?;
        serde_json::from_value(value).map_err(|err| ClientError::Deserialization(err.to_string()))
    }

    /// Assemble the request for `path` without touching the network.
    ///
    /// The `authorization` header is always sent; with no stored token it
    /// carries an empty credential rather than being omitted.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> HttpRequest {
        let token = self.session.token().unwrap_or_default();
        HttpRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            headers: vec![
                ("authorization".to_string(), format!("Bearer {token}")),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body,
        }
    }

    /// Execute the request. Transport-level failures, refused connections and
    /// the like, map to `Network`; any status that does arrive is returned as
    /// data for `parse_response` to judge.
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        log::debug!("{} {}", request.method.as_str(), request.url);

        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let result = match (method, body) {
            (HttpMethod::Get, _) => headers
                .iter()
                .fold(self.agent.get(&url), |call, (name, value)| {
                    call.header(name.as_str(), value.as_str())
                })
                .call(),
            (HttpMethod::Delete, _) => headers
                .iter()
                .fold(self.agent.delete(&url), |call, (name, value)| {
                    call.header(name.as_str(), value.as_str())
                })
                .call(),
            (HttpMethod::Post, Some(payload)) => headers
                .iter()
                .fold(self.agent.post(&url), |call, (name, value)| {
                    call.header(name.as_str(), value.as_str())
                })
                .send(payload.as_bytes()),
            (HttpMethod::Post, None) => headers
                .iter()
                .fold(self.agent.post(&url), |call, (name, value)| {
                    call.header(name.as_str(), value.as_str())
                })
                .send_empty(),
            (HttpMethod::Put, Some(payload)) => headers
                .iter()
                .fold(self.agent.put(&url), |call, (name, value)| {
                    call.header(name.as_str(), value.as_str())
                })
                .send(payload.as_bytes()),
            (HttpMethod::Put, None) => headers
                .iter()
                .fold(self.agent.put(&url), |call, (name, value)| {
                    call.header(name.as_str(), value.as_str())
                })
                .send_empty(),
            (HttpMethod::Patch, Some(payload)) => headers
                .iter()
                .fold(self.agent.patch(&url), |call, (name, value)| {
                    call.header(name.as_str(), value.as_str())
                })
                .send(payload.as_bytes()),
            (HttpMethod::Patch, None) => headers
                .iter()
                .fold(self.agent.patch(&url), |call, (name, value)| {
                    call.header(name.as_str(), value.as_str())
                })
                .send_empty(),
        };

        let mut response = result.map_err(|err| ClientError::Network(err.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| ClientError::Network(err.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// Interpret a response according to its status and declared content type.
    ///
    /// Servers behind a reverse proxy can answer with HTML error pages, so a
    /// non-JSON content type is read as text first: failure statuses become
    /// `Transport` with the raw text, success bodies still get one JSON parse
    /// attempt before giving up with `Format`. Under a JSON (or absent)
    /// content type, failure statuses become `Api` with the server's own
    /// message where one can be extracted.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ClientError> {
        let declares_json = match response.content_type() {
            Some(value) => value.contains("application/json"),
            None => true,
        };

        if !declares_json {
            if !response.is_success() {
                return Err(ClientError::Transport {
                    status: response.status,
                    status_text: response.status_text().to_string(),
                    body: snippet(&response.body),
                });
            }
            return serde_json::from_str(&response.body).map_err(|_| ClientError::Format {
                body: snippet(&response.body),
            });
        }

        if !response.is_success() {
            let message = error_message(&response.body)
                .unwrap_or_else(|| response.status_text().to_string());
            return Err(ClientError::Api {
                status: response.status,
                message,
            });
        }

        serde_json::from_str(&response.body).map_err(|_| ClientError::Format {
            body: snippet(&response.body),
        })
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<String, ClientError> {
    serde_json::to_string(body).map_err(|err| ClientError::Serialization(err.to_string()))
}

/// Pull a human-readable message out of a JSON error body. `None` when the
/// body is not JSON at all (callers fall back to the status text); a body
/// that parses but carries neither `message` nor `detail` yields
/// "Unknown error".
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = field_text(&value, "message")
        .or_else(|| field_text(&value, "detail"))
        .unwrap_or_else(|| "Unknown error".to_string());
    Some(message)
}

/// A `message`/`detail` field may hold any JSON value; validation errors
/// commonly arrive as an array of objects, so non-string values are
/// stringified rather than dropped.
fn field_text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(BODY_SNIPPET_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:8000", Arc::new(SessionStore::in_memory()))
    }

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![(
                "content-type".to_string(),
                "application/json".to_string(),
            )],
            body: body.to_string(),
        }
    }

    fn text_response(status: u16, content_type: &str, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: body.to_string(),
        }
    }

    #[test]
    fn build_request_sends_empty_bearer_without_token() {
        let req = client().build_request(HttpMethod::Get, "/api/todos", None);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/todos");
        assert_eq!(
            req.headers,
            vec![
                ("authorization".to_string(), "Bearer ".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ]
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn build_request_carries_stored_token() {
        let session = Arc::new(SessionStore::in_memory());
        session.set_token("abc.def.ghi");
        let client = ApiClient::new("http://localhost:8000", session);

        let req = client.build_request(HttpMethod::Post, "/api/todos", Some("{}".to_string()));
        assert_eq!(
            req.headers[0],
            ("authorization".to_string(), "Bearer abc.def.ghi".to_string())
        );
        assert_eq!(req.body.as_deref(), Some("{}"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ApiClient::new(
            "http://localhost:8000/",
            Arc::new(SessionStore::in_memory()),
        );
        assert_eq!(client.base_url(), "http://localhost:8000");
        let req = client.build_request(HttpMethod::Get, "/api/todos", None);
        assert_eq!(req.url, "http://localhost:8000/api/todos");
    }

    #[test]
    fn parse_json_success_returns_value() {
        let value = client()
            .parse_response(json_response(200, r#"{"id":"1","title":"x"}"#))
            .unwrap();
        assert_eq!(value, json!({"id": "1", "title": "x"}));
    }

    #[test]
    fn parse_missing_content_type_treated_as_json() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"[1,2,3]"#.to_string(),
        };
        let value = client().parse_response(response).unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn parse_error_status_with_detail_is_api_error() {
        let err = client()
            .parse_response(json_response(500, r#"{"detail":"server error"}"#))
            .unwrap_err();
        match &err {
            ClientError::Api { status, message } => {
                assert_eq!(*status, 500);
                assert_eq!(message, "server error");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert!(err.to_string().contains("server error"));
    }

    #[test]
    fn parse_error_prefers_message_over_detail() {
        let err = client()
            .parse_response(json_response(
                400,
                r#"{"message":"bad title","detail":"unused"}"#,
            ))
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Api { status: 400, ref message } if message == "bad title"
        ));
    }

    #[test]
    fn parse_error_with_unparseable_body_falls_back_to_status_text() {
        let err = client().parse_response(json_response(404, "")).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Api { status: 404, ref message } if message == "Not Found"
        ));
    }

    #[test]
    fn parse_error_with_neither_field_is_unknown() {
        let err = client()
            .parse_response(json_response(500, r#"{"ok":false}"#))
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Api { ref message, .. } if message == "Unknown error"
        ));
    }

    #[test]
    fn parse_non_string_detail_is_stringified() {
        let err = client()
            .parse_response(json_response(
                422,
                r#"{"detail":[{"loc":["body","title"],"msg":"field required"}]}"#,
            ))
            .unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 422);
                assert!(message.contains("field required"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn parse_html_error_is_transport_error() {
        let body = "<html><body><h1>502 Bad Gateway</h1></body></html>";
        let err = client()
            .parse_response(text_response(502, "text/html", body))
            .unwrap_err();
        match &err {
            ClientError::Transport {
                status,
                status_text,
                body: received,
            } => {
                assert_eq!(*status, 502);
                assert_eq!(status_text, "Bad Gateway");
                assert_eq!(received, body);
            }
            other => panic!("expected Transport error, got {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("502"));
        assert!(message.contains("<html>"));
    }

    #[test]
    fn transport_error_body_is_truncated_to_200_chars() {
        let body = "x".repeat(500);
        let err = client()
            .parse_response(text_response(502, "text/html", &body))
            .unwrap_err();
        match err {
            ClientError::Transport { body: received, .. } => {
                assert_eq!(received.chars().count(), 200)
            }
            other => panic!("expected Transport error, got {other:?}"),
        }
    }

    #[test]
    fn parse_plain_text_json_succeeds() {
        let value = client()
            .parse_response(text_response(200, "text/plain", r#"{"status":"healthy"}"#))
            .unwrap();
        assert_eq!(value, json!({"status": "healthy"}));
    }

    #[test]
    fn parse_plain_text_garbage_is_format_error() {
        let err = client()
            .parse_response(text_response(200, "text/plain", "you have mail"))
            .unwrap_err();
        match &err {
            ClientError::Format { body } => assert_eq!(body, "you have mail"),
            other => panic!("expected Format error, got {other:?}"),
        }
        assert!(err.to_string().contains("you have mail"));
    }

    #[test]
    fn parse_success_json_content_type_with_bad_body_is_format_error() {
        let err = client()
            .parse_response(json_response(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ClientError::Format { ref body } if body == "not json"));
    }

    #[test]
    fn content_type_lookup_is_case_insensitive() {
        let response = HttpResponse {
            status: 502,
            headers: vec![("Content-Type".to_string(), "text/html".to_string())],
            body: "<html></html>".to_string(),
        };
        let err = client().parse_response(response).unwrap_err();
        assert!(matches!(err, ClientError::Transport { status: 502, .. }));
    }

    #[test]
    fn charset_suffix_still_counts_as_json() {
        let response = text_response(
            500,
            "application/json; charset=utf-8",
            r#"{"detail":"server error"}"#,
        );
        let err = client().parse_response(response).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Api { status: 500, ref message } if message == "server error"
        ));
    }
}
