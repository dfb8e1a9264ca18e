//! The client side of the REST boundary: request execution, the response
//! envelope, and query-string serialization.
//!
//! [execute] is the single path every store request goes through, so the
//! error normalization of [crate::Error] is applied identically regardless
//! of which endpoint failed.

mod envelope;
mod query;
mod transport;

pub use query::Query;
pub use transport::{ApiRequest, ApiTransport, Method, RawResponse, TransportError};

pub(crate) use envelope::{Page, decode_data, decode_page, decode_page_or_empty};

use serde_json::Value;

use crate::Error;

/// A successful, unwrapped API response.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ApiSuccess {
    /// The server's human-readable outcome message, when it sent one.
    pub message: Option<String>,
    /// The envelope's `data`, `Null` when the server sent none.
    pub data: Value,
}

/// Send `request` and unwrap the response envelope.
///
/// Normalization order on failure: a structured `success: false` body wins,
/// then the fixed per-status message table, then the raw transport message.
pub(crate) async fn execute<T: ApiTransport>(
    transport: &T,
    request: ApiRequest,
) -> Result<ApiSuccess, Error> {
    let method = request.method;
    let path = request.path.clone();

    let response = transport.send(request).await?;

    tracing::debug!("{method:?} {path} answered with status {}", response.status);

    let envelope = response
        .body
        .and_then(|body| serde_json::from_value::<envelope::Envelope>(body).ok());

    match envelope {
        Some(envelope) if envelope.success => Ok(ApiSuccess {
            message: envelope.message,
            data: envelope.data.unwrap_or(Value::Null),
        }),
        Some(envelope) => match envelope.failure_message() {
            Some(message) => Err(Error::Api {
                status: response.status,
                message,
            }),
            // A failure envelope with nothing to say falls through to the
            // status table.
            None => Err(Error::Status(response.status)),
        },
        None if !(200..300).contains(&response.status) => Err(Error::Status(response.status)),
        None => Err(Error::Decode(format!(
            "the response from {path} was not a valid envelope"
        ))),
    }
}
