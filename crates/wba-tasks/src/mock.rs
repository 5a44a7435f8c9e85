//! Scripted transport for testing
//!
//! Replies are queued per URL and handed out in order; the last reply for
//! a URL repeats forever. Unscripted URLs fail with a connection error.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::auth::AuthHeaders;
use crate::transport::{HttpReply, TaskTransport, TransportError};

/// A request seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
    pub headers: AuthHeaders,
}

type Reply = Result<HttpReply, TransportError>;

/// A transport answering from a script instead of the network
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for a URL
    pub fn reply(&self, url: &str, reply: HttpReply) -> &Self {
        self.push(url, Ok(reply))
    }

    /// Queue a transport failure for a URL
    pub fn fail(&self, url: &str, error: TransportError) -> &Self {
        self.push(url, Err(error))
    }

    fn push(&self, url: &str, reply: Reply) -> &Self {
        lock(&self.script)
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Every request so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of requests made to a URL
    pub fn count(&self, url: &str) -> usize {
        lock(&self.calls).iter().filter(|c| c.url == url).count()
    }

    fn answer(&self, call: RecordedCall) -> Reply {
        let url = call.url.clone();
        lock(&self.calls).push(call);

        let mut script = lock(&self.script);
        match script.get_mut(&url) {
            Some(replies) if replies.len() > 1 => replies
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::ConnectionFailed(url.clone()))),
            Some(replies) => replies
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::ConnectionFailed(url.clone()))),
            None => Err(TransportError::ConnectionFailed(format!("no route for {url}"))),
        }
    }
}

#[async_trait]
impl TaskTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &AuthHeaders,
    ) -> Result<HttpReply, TransportError> {
        self.answer(RecordedCall {
            method: "POST",
            url: url.to_string(),
            body: Some(body.clone()),
            headers: headers.clone(),
        })
    }

    async fn get_json(&self, url: &str, headers: &AuthHeaders) -> Result<HttpReply, TransportError> {
        self.answer(RecordedCall {
            method: "GET",
            url: url.to_string(),
            body: None,
            headers: headers.clone(),
        })
    }
}
