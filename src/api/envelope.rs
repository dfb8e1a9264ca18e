//! Decoding of the API's response envelope and paginated list payloads.
//!
//! Every response body is an envelope, either
//! `{ "success": true, "message": ..., "data": ..., "meta": ... }` or
//! `{ "success": false, "message": ..., "errors": [...] }`. List endpoints
//! nest `{ "data": [...], "meta": { total, page, limit, totalPages } }` one
//! level inside the envelope's `data`.

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{Error, pagination::Pagination};

/// The wire shape of every response body.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    /// Whether the operation succeeded. `data` must not be assumed present
    /// when this is false.
    pub success: bool,
    /// A human-readable message describing the outcome.
    #[serde(default)]
    pub message: Option<String>,
    /// The payload of a successful response.
    #[serde(default)]
    pub data: Option<Value>,
    /// Field-level error messages of a failed response.
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl Envelope {
    /// The normalized message of a failure envelope: the top-level message,
    /// or the first entry of `errors` when the message is absent.
    pub fn failure_message(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.errors.as_ref().and_then(|errors| errors.first().cloned()))
    }
}

/// One page of a list endpoint's records together with its pagination
/// metadata.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    /// The records of this page.
    pub data: Vec<T>,
    /// Where this page sits in the full result set.
    pub meta: Pagination,
}

impl<T> Page<T> {
    /// The page a store falls back to when a list payload is unusable: no
    /// records, pagination reset to the zero state.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            meta: Pagination::default(),
        }
    }
}

/// Decode a list payload strictly, failing on any shape mismatch.
pub(crate) fn decode_page<T: DeserializeOwned>(data: Value) -> Result<Page<T>, Error> {
    serde_json::from_value(data).map_err(Error::from)
}

/// Decode a list payload, degrading to an empty page when the `data` array
/// is missing or malformed.
///
/// Leaving stale records paired with mismatched pagination metadata is
/// worse than showing an empty list, so shape problems reset both together
/// and only log a warning.
pub(crate) fn decode_page_or_empty<T: DeserializeOwned>(data: Value, context: &str) -> Page<T> {
    match serde_json::from_value(data) {
        Ok(page) => page,
        Err(error) => {
            tracing::warn!("malformed {context} list payload, degrading to an empty page: {error}");
            Page::empty()
        }
    }
}

/// Decode the `data` of a successful envelope into a concrete type.
pub(crate) fn decode_data<T: DeserializeOwned>(data: Value) -> Result<T, Error> {
    serde_json::from_value(data).map_err(Error::from)
}
