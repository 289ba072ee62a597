//! HTTP transport abstraction for the Radar client.
//!
//! The client's business logic is identical regardless of which transport is
//! injected: `HttpTransport` issues real requests via reqwest, while
//! `FixtureTransport` serves the canned payloads used when a scope is
//! disabled by the test level. Tests inject a scripted mock.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use super::error::RadarError;

/// Explicit connect/read timeout; the job would otherwise hang on a stalled
/// endpoint with no cancellation mechanism.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

/// Formats a request/response pair for the audit log. There is no persisted
/// transaction log, so this is the primary record of what the job did.
/// The bearer token is redacted.
pub fn describe_exchange(request: &ApiRequest, response: &ApiResponse) -> String {
    let auth = if request.bearer.is_some() {
        "Bearer <redacted>"
    } else {
        "<none>"
    };
    let body = request
        .body
        .as_ref()
        .map(|b| b.to_string())
        .unwrap_or_default();
    format!(
        "---------------- Request ----------------\n\
         Method: {}\n\
         URL: {}\n\
         Authorization: {}\n\
         Body: {}\n\
         ---------------- Response ----------------\n\
         Status Code: {}\n\
         Reason: {}\n\
         Text: {}",
        request.method.as_str(),
        request.url,
        auth,
        body,
        response.status,
        response.reason,
        response.body,
    )
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, RadarError>;
}

/// Real transport backed by reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, RadarError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, RadarError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Delete => self.client.delete(&request.url),
        };
        builder = builder.header(CONTENT_TYPE, "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(ApiResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

/// Canned responses matching the production API's shapes, served when the
/// test level disables a scope. The payloads mirror a small real fleet so a
/// full-test run exercises the whole reconciliation path.
pub struct FixtureTransport;

const FIXTURE_TOKEN: &str = r#"{"access_token":"TEST-TOKEN"}"#;

const FIXTURE_ASSETS: &str = r#"[
    {"id": "123-456-001", "identifier": "26706"},
    {"id": "123-456-002", "identifier": "27317"},
    {"id": "123-456-003", "identifier": "27319"},
    {"id": "123-456-004", "identifier": "27320"},
    {"id": "123-456-005", "identifier": "47322"}
]"#;

const FIXTURE_LABELS: &str =
    r#"{"items": [{"name": "PM Service and Inspect - 90%", "id": "555-123-456"}]}"#;

#[async_trait]
impl Transport for FixtureTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, RadarError> {
        let canned = |status: u16, reason: &str, body: &str| ApiResponse {
            status,
            reason: reason.to_string(),
            body: body.to_string(),
        };
        let response = match request.method {
            Method::Post if request.url.ends_with("/token") => {
                canned(200, "OK", FIXTURE_TOKEN)
            }
            Method::Get if request.url.ends_with("/assets") => {
                canned(200, "OK", FIXTURE_ASSETS)
            }
            Method::Get if request.url.ends_with("/labels") => {
                canned(200, "OK", FIXTURE_LABELS)
            }
            Method::Post if request.url.ends_with("/labels") => canned(201, "Created", ""),
            Method::Delete => canned(204, "No Content", ""),
            _ => canned(404, "Not Found", ""),
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, url: &str) -> ApiRequest {
        ApiRequest {
            method,
            url: url.to_string(),
            bearer: None,
            body: None,
        }
    }

    #[tokio::test]
    async fn test_fixture_routes() {
        let t = FixtureTransport;
        let token = t
            .execute(&request(Method::Post, "https://x/1/token"))
            .await
            .unwrap();
        assert_eq!(token.status, 200);
        assert!(token.body.contains("TEST-TOKEN"));

        let assets = t
            .execute(&request(Method::Get, "https://x/1/assets"))
            .await
            .unwrap();
        assert_eq!(assets.status, 200);

        let add = t
            .execute(&request(Method::Post, "https://x/1/assets/a/labels"))
            .await
            .unwrap();
        assert_eq!(add.status, 201);

        let del = t
            .execute(&request(Method::Delete, "https://x/1/assets/a/labels/l"))
            .await
            .unwrap();
        assert_eq!(del.status, 204);
    }

    #[test]
    fn test_describe_exchange_redacts_bearer() {
        let mut req = request(Method::Get, "https://x/1/assets");
        req.bearer = Some("secret-token".into());
        let resp = ApiResponse {
            status: 200,
            reason: "OK".into(),
            body: "[]".into(),
        };
        let text = describe_exchange(&req, &resp);
        assert!(text.contains("Bearer <redacted>"));
        assert!(!text.contains("secret-token"));
    }
}
