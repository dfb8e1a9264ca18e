//! Test doubles shared by the store tests: a transport that plays back
//! queued responses and records every request it was given.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{Value, json};

use crate::api::{ApiRequest, ApiTransport, Method, RawResponse, TransportError};

/// Install a log subscriber so `RUST_LOG=pocketledger=debug cargo test`
/// shows the request and decode logging. Safe to call from every test.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An [ApiTransport] that answers from a queue of canned outcomes.
///
/// Panics when a request arrives with nothing queued, which makes an
/// unexpected network call a test failure.
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a 200 response with the given body.
    pub fn push_ok(&self, body: Value) {
        self.responses.lock().unwrap().push_back(Ok(RawResponse {
            status: 200,
            body: Some(body),
        }));
    }

    /// Queue a response with the given status and no body.
    pub fn push_status(&self, status: u16) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse { status, body: None }));
    }

    /// Queue a response with the given status and body.
    pub fn push_status_body(&self, status: u16, body: Value) {
        self.responses.lock().unwrap().push_back(Ok(RawResponse {
            status,
            body: Some(body),
        }));
    }

    /// Queue a transport-level connection failure.
    pub fn push_connection_failure(&self, detail: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(TransportError::Connection(detail.to_owned())));
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The number of requests sent so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The number of requests sent so far with the given method and path.
    pub fn count_requests_to(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }
}

impl ApiTransport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let outcome = {
            let mut responses = self.responses.lock().unwrap();
            self.requests.lock().unwrap().push(request.clone());
            responses.pop_front()
        };

        match outcome {
            Some(outcome) => outcome,
            None => panic!("no canned response queued for {:?} {}", request.method, request.path),
        }
    }
}

/// A success envelope with the given message and data.
pub(crate) fn envelope_ok(message: Option<&str>, data: Value) -> Value {
    json!({
        "success": true,
        "message": message,
        "data": data,
    })
}

/// A success envelope wrapping one page of a list endpoint.
pub(crate) fn envelope_page(
    items: Value,
    total: u64,
    page: u64,
    limit: u64,
    total_pages: u64,
) -> Value {
    json!({
        "success": true,
        "message": null,
        "data": {
            "data": items,
            "meta": { "total": total, "page": page, "limit": limit, "totalPages": total_pages },
        },
    })
}

/// A failure envelope with a server message.
pub(crate) fn envelope_failure(message: &str) -> Value {
    json!({
        "success": false,
        "message": message,
    })
}
