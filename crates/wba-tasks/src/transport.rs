//! Transport trait and common types

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::auth::AuthHeaders;

/// Errors below the HTTP status level
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    /// Parsed JSON body, `None` when empty or not JSON
    pub body: Option<Value>,
}

impl HttpReply {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, Some(body))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves JSON between the client and the backend
#[async_trait]
pub trait TaskTransport: Send + Sync + std::fmt::Debug {
    /// Transport name for logs
    fn name(&self) -> &str;

    /// `POST` a JSON body
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &AuthHeaders,
    ) -> Result<HttpReply, TransportError>;

    /// `GET` a JSON document
    async fn get_json(&self, url: &str, headers: &AuthHeaders) -> Result<HttpReply, TransportError>;
}
