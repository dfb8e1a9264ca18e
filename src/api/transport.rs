//! Defines the transport trait that connects the stores to the REST API.
//!
//! The stores never speak HTTP themselves. They build an [ApiRequest] and
//! hand it to an [ApiTransport] implementation, which is provided by the
//! embedding application (and by [crate::test_utils] in tests). The
//! transport only moves bytes; envelope handling and error normalization
//! happen in [crate::api].

use std::future::Future;

use serde_json::Value;

/// The HTTP method of an [ApiRequest].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Fetch a resource.
    Get,
    /// Create a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Remove a resource.
    Delete,
}

/// A request to the REST API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// The HTTP method to use.
    pub method: Method,
    /// The path of the endpoint, e.g. `/api/accounts`.
    pub path: String,
    /// Query parameters as ordered key/value pairs, not yet percent-encoded.
    pub query: Vec<(String, String)>,
    /// The JSON body, for methods that carry one.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// A GET request with query parameters.
    pub fn get(path: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query,
            body: None,
        }
    }

    /// A POST request with a JSON body.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// A PUT request with a JSON body.
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// A DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }
}

/// A response as seen by the transport: a status code and, when the server
/// sent one, a JSON body. Bodies that are not JSON are treated as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The JSON body, if any.
    pub body: Option<Value>,
}

/// The errors a transport may fail with before a response exists.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// No response was received (DNS failure, refused connection, timeout).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The transport failed in some other way, e.g. a request could not be
    /// serialized.
    #[error("{0}")]
    Other(String),
}

/// Moves requests to the REST API and responses back.
pub trait ApiTransport {
    /// Send `request` and wait for the server's response.
    ///
    /// Implementations must return `Ok` for every response the server
    /// produced, including error statuses; [TransportError] is only for
    /// failures where no response exists.
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}
