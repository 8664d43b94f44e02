//! Testing utilities.
//!
//! [`MockTransport`] stands in for the network so code using [`UcsClient`](crate::UcsClient)
//! can be tested without a UCS server.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::error::Result;
use crate::transport::{OutboundRequest, RawResponse, Transport};

/// A scripted transport that records every request it receives.
///
/// Responses are returned in the order they were queued. Once the queue is
/// empty, the fallback response (a successful empty envelope by default) is
/// returned.
#[derive(Clone)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<RawResponse>>>,
    fallback: RawResponse,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<OutboundRequest>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Arc::default(),
            fallback: envelope_response("0", "", Value::Null),
            delay: None,
            calls: Arc::default(),
        }
    }

    /// Queue a successful envelope carrying `result`.
    pub fn with_success(self, result: Value) -> Self {
        self.with_response(envelope_response("0", "", result))
    }

    /// Queue a business failure envelope.
    pub fn with_failure(self, code: &str, message: &str) -> Self {
        self.with_response(envelope_response(code, message, Value::Null))
    }

    /// Queue a raw status and body.
    pub fn with_status(self, status: StatusCode, body: impl Into<String>) -> Self {
        self.with_response(RawResponse {
            status,
            body: body.into(),
        })
    }

    pub fn with_response(self, response: RawResponse) -> Self {
        lock(&self.responses).push_back(response);
        self
    }

    /// Sleep before answering, to exercise timeouts and cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all requests sent through this transport.
    pub fn calls(&self) -> Vec<OutboundRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Most recent request, if any.
    pub fn last_call(&self) -> Option<OutboundRequest> {
        lock(&self.calls).last().cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse> {
        lock(&self.calls).push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = lock(&self.responses).pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

/// A 200 response wrapping `{code, message, result}`.
pub fn envelope_response(code: &str, message: &str, result: Value) -> RawResponse {
    RawResponse {
        status: StatusCode::OK,
        body: json!({ "code": code, "message": message, "result": result }).to_string(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
