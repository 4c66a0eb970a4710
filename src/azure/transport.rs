//! Outbound Azure Resource Manager calls.
//!
//! Every call to Azure goes through [`ArmTransport`]. [`HttpTransport`] is the
//! production implementation; [`super::ReplayTransport`] serves recorded
//! responses from disk.

use crate::error::{UtilizationError, UtilizationResult};
use async_trait::async_trait;
use colored::Colorize;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Longest upstream error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// The external API an outbound call is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmOperation {
    ServiceLimit,
    ResourceGraph,
    SkuCatalog,
    Reservations,
}

impl ArmOperation {
    /// Stable identifier, also the base name of recorded response files.
    pub fn key(&self) -> &'static str {
        match self {
            ArmOperation::ServiceLimit => "service_limit",
            ArmOperation::ResourceGraph => "resource_graph",
            ArmOperation::SkuCatalog => "skus",
            ArmOperation::Reservations => "reservations",
        }
    }

    /// Human readable name used in log and error messages.
    pub fn context(&self) -> &'static str {
        match self {
            ArmOperation::ServiceLimit => "service limit",
            ArmOperation::ResourceGraph => "resource graph",
            ArmOperation::SkuCatalog => "sku catalog",
            ArmOperation::Reservations => "reservations",
        }
    }
}

impl fmt::Display for ArmOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.context())
    }
}

/// One outbound call.
#[derive(Debug, Clone)]
pub struct ArmRequest {
    pub operation: ArmOperation,
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    /// Location the call is about, if any.
    pub location: Option<String>,
}

impl ArmRequest {
    pub fn get(operation: ArmOperation, url: impl Into<String>) -> ArmRequest {
        ArmRequest {
            operation,
            method: Method::GET,
            url: url.into(),
            body: None,
            location: None,
        }
    }

    pub fn post(operation: ArmOperation, url: impl Into<String>, body: Value) -> ArmRequest {
        ArmRequest {
            operation,
            method: Method::POST,
            url: url.into(),
            body: Some(body),
            location: None,
        }
    }

    pub fn with_location(mut self, location: &str) -> ArmRequest {
        self.location = Some(location.to_ascii_lowercase());
        self
    }
}

/// Sends a request to Azure and returns the parsed JSON body.
///
/// Implementations must fail with [`UtilizationError::UpstreamFailure`] for a
/// non-success status.
#[async_trait]
pub trait ArmTransport: Send + Sync {
    async fn send(&self, request: &ArmRequest) -> UtilizationResult<Value>;
}

/// Transport over HTTPS with a fixed bearer token.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client that sends `Authorization: Bearer <token>` and
    /// `Accept: application/json` on every call.
    pub fn new(token: &str, timeout: Duration) -> UtilizationResult<HttpTransport> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| UtilizationError::Credential(format!("token is not a valid header: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl ArmTransport for HttpTransport {
    async fn send(&self, request: &ArmRequest) -> UtilizationResult<Value> {
        log::debug!(
            "{operation} {method} {url}",
            operation = request.operation,
            method = request.method,
            url = request.url.on_blue()
        );

        let mut builder = self.client.request(request.method.clone(), &request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        log::debug!(
            "{operation} status={status} body.len()={len}",
            operation = request.operation,
            len = text.len()
        );

        ensure_success(request.operation, status, &text)?;
        parse_body(request.operation, &text)
    }
}

/// Turn a non-success status into [`UtilizationError::UpstreamFailure`].
pub fn ensure_success(
    operation: ArmOperation,
    status: StatusCode,
    body: &str,
) -> UtilizationResult<()> {
    if status.is_success() {
        return Ok(());
    }
    log::warn!(
        "{failed} {operation} status={status}",
        failed = "failed".on_red()
    );
    Err(UtilizationError::UpstreamFailure {
        operation,
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY).collect(),
    })
}

/// Parse a response body, reporting the JSON path of any mismatch.
pub fn parse_body(operation: ArmOperation, body: &str) -> UtilizationResult<Value> {
    let mut deserializer = serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| UtilizationError::parse(operation.context(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_success_passes_2xx() {
        assert!(ensure_success(ArmOperation::SkuCatalog, StatusCode::OK, "{}").is_ok());
        assert!(ensure_success(ArmOperation::SkuCatalog, StatusCode::NO_CONTENT, "").is_ok());
    }

    #[test]
    fn test_ensure_success_rejects_failure() {
        let body = "x".repeat(2000);
        let err = ensure_success(ArmOperation::Reservations, StatusCode::FORBIDDEN, &body)
            .expect_err("403 must fail");
        match err {
            UtilizationError::UpstreamFailure {
                operation,
                status,
                body,
            } => {
                assert_eq!(operation, ArmOperation::Reservations);
                assert_eq!(status, 403);
                assert_eq!(body.len(), MAX_ERROR_BODY);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_body() {
        let value = parse_body(ArmOperation::ServiceLimit, r#"{"properties":{"limit":1}}"#)
            .expect("valid json");
        assert_eq!(value["properties"]["limit"], 1);

        let err = parse_body(ArmOperation::ServiceLimit, "<html>").expect_err("not json");
        assert!(matches!(err, UtilizationError::Parse { context: "service limit", .. }));
    }

    #[test]
    fn test_request_builders() {
        let request = ArmRequest::get(ArmOperation::SkuCatalog, "https://x/skus").with_location("WestEurope");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.location.as_deref(), Some("westeurope"));
        assert!(request.body.is_none());

        let request = ArmRequest::post(
            ArmOperation::ResourceGraph,
            "https://x/resources",
            serde_json::json!({"query": "resources"}),
        );
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.operation.key(), "resource_graph");
    }
}
