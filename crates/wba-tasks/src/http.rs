//! reqwest-backed transport

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::auth::AuthHeaders;
use crate::transport::{HttpReply, TaskTransport, TransportError};

/// HTTP transport for the analytics backend
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(Self { client })
    }

    fn apply_headers(
        mut builder: reqwest::RequestBuilder,
        headers: &AuthHeaders,
    ) -> reqwest::RequestBuilder {
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        builder
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<HttpReply, TransportError> {
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        // Error pages are often HTML; keep the status and drop the body
        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice::<Value>(&bytes).ok()
        };

        Ok(HttpReply { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_decode() {
        TransportError::InvalidResponse(e.to_string())
    } else {
        TransportError::ConnectionFailed(e.to_string())
    }
}

#[async_trait]
impl TaskTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &AuthHeaders,
    ) -> Result<HttpReply, TransportError> {
        let builder = Self::apply_headers(self.client.post(url).json(body), headers);
        self.send(builder).await
    }

    async fn get_json(&self, url: &str, headers: &AuthHeaders) -> Result<HttpReply, TransportError> {
        let builder = Self::apply_headers(self.client.get(url), headers);
        self.send(builder).await
    }
}
