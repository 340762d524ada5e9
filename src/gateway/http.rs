//! `reqwest`-backed transport.

use reqwest::header::AUTHORIZATION;
use serde_json::Value;

use super::types::{InboundResponse, OutboundRequest, Transport, TransportError};
use crate::config::ClientConfig;

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for the configured API base URL.
    ///
    /// No request timeout is set; only the optional connect timeout applies.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(concat!("bookshare/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| TransportError(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url: config.api_base_url.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<InboundResponse, TransportError> {
        let url = resolve_url(&self.base_url, &request.path);
        let mut builder = self.http.request(request.method.into(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(authorization) = &request.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(InboundResponse { status, body: parse_body(&text) })
    }
}

pub(crate) fn resolve_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Empty → `Null`, JSON → parsed, anything else → the raw text as a string.
pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
