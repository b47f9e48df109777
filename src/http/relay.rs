//! Outbound pass-through requests issued on behalf of front ends.
//!
//! Sends an arbitrary request and reports status, headers and body back as
//! data. Upstream status codes are never treated as errors.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid header: {0:?}")]
    InvalidHeader(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Body of `POST /api/send`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayRequest {
    pub url: String,
    /// Empty means GET.
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Raw request body; empty sends none.
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub status: u16,
    /// First value of each response header.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct Relay {
    client: reqwest::Client,
}

impl Relay {
    pub fn new(timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub async fn send(&self, request: RelayRequest) -> Result<RelayResponse, RelayError> {
        let method = if request.method.trim().is_empty() {
            Method::GET
        } else {
            Method::from_bytes(request.method.trim().as_bytes())
                .map_err(|_| RelayError::InvalidMethod(request.method.clone()))?
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| RelayError::InvalidHeader(name.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| RelayError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }
        if !request.data.is_empty() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        tracing::debug!(method = %method, url = %request.url, "Relaying request");

        let mut builder = self.client.request(method, &request.url).headers(headers);
        if !request.data.is_empty() {
            builder = builder.body(request.data);
        }
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let mut headers = BTreeMap::new();
        for name in response.headers().keys() {
            if let Some(value) = response.headers().get(name) {
                headers.insert(name.to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned());
            }
        }
        let body = response.text().await?;

        Ok(RelayResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Bytes, http::HeaderMap as AxumHeaders, routing::any, Router};

    async fn echo_upstream() -> String {
        async fn echo(method: axum::http::Method, headers: AxumHeaders, body: Bytes) -> (axum::http::StatusCode, [(&'static str, &'static str); 1], String) {
            let content_type = headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
                .to_string();
            (
                axum::http::StatusCode::CREATED,
                [("x-upstream", "yes")],
                format!("{method}|{content_type}|{}", String::from_utf8_lossy(&body)),
            )
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().route("/echo", any(echo))).await.unwrap();
        });
        format!("http://{addr}/echo")
    }

    fn relay() -> Relay {
        Relay::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn data_defaults_to_json_content_type() {
        let url = echo_upstream().await;
        let response = relay()
            .send(RelayRequest {
                url,
                method: "POST".into(),
                headers: BTreeMap::new(),
                data: r#"{"a":1}"#.into(),
            })
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.body, r#"POST|application/json|{"a":1}"#);
        assert_eq!(response.headers.get("x-upstream").map(String::as_str), Some("yes"));
    }

    #[tokio::test]
    async fn explicit_content_type_is_kept() {
        let url = echo_upstream().await;
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        let response = relay()
            .send(RelayRequest { url, method: "PUT".into(), headers, data: "hi".into() })
            .await
            .unwrap();
        assert_eq!(response.body, "PUT|text/plain|hi");
    }

    #[tokio::test]
    async fn empty_method_is_get_without_body() {
        let url = echo_upstream().await;
        let response = relay().send(RelayRequest { url, ..Default::default() }).await.unwrap();
        assert_eq!(response.body, "GET|none|");
    }

    #[tokio::test]
    async fn bad_input_is_rejected() {
        let err = relay()
            .send(RelayRequest { url: "http://127.0.0.1:1/".into(), method: "BAD METHOD".into(), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidMethod(_)));

        let err = relay()
            .send(RelayRequest { url: "not a url".into(), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Request(_)));
    }
}
