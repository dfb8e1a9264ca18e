//! Defines the app level error type and the normalization of transport and
//! API failures into the human-readable messages shown by the app.
//!
//! Every store reports failures through [Error]. The `Display` string of a
//! variant *is* the normalized message, so storing `error.to_string()` and
//! propagating the error itself always agree. Resolution order for a failed
//! request: structured API body, then the HTTP status table, then the raw
//! error message, then a generic fallback.

use crate::api::TransportError;

/// The errors that may occur in the client stores.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// No response was received from the server.
    ///
    /// The underlying transport detail is kept for logging but is not part
    /// of the user-facing message.
    #[error("Unable to reach the server. Please check your connection and try again.")]
    Network(String),

    /// The server answered with a structured failure envelope
    /// (`success: false`) carrying a message or an `errors` array.
    #[error("{message}")]
    Api {
        /// The HTTP status code the envelope arrived with.
        status: u16,
        /// The server-supplied message, or the first entry of `errors`.
        message: String,
    },

    /// The server answered with a non-success HTTP status and no structured
    /// body to take a message from.
    #[error("{}", status_message(*.0))]
    Status(u16),

    /// A response body could not be decoded into the expected shape.
    #[error("{0}")]
    Decode(String),

    /// A request was rejected client-side before any network call.
    #[error("{0}")]
    Validation(String),

    /// Anything else. Holds the original error's message, or the generic
    /// fallback when that message was empty.
    #[error("{0}")]
    Other(String),
}

/// The message to show when nothing more specific is known.
pub(crate) const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// The fixed message table for HTTP statuses without a structured body.
fn status_message(status: u16) -> String {
    match status {
        400 => "Invalid request.".to_owned(),
        401 => "You are not logged in. Please log in and try again.".to_owned(),
        403 => "You do not have permission to perform this action.".to_owned(),
        404 => "Resource not found.".to_owned(),
        409 => "The request conflicts with the current state of the resource.".to_owned(),
        422 => "The submitted data failed validation.".to_owned(),
        500 => "An internal server error occurred. Please try again later.".to_owned(),
        502 => "The server is temporarily unreachable.".to_owned(),
        503 => "The service is temporarily unavailable. Please try again later.".to_owned(),
        status => format!("Request failed with status {status}"),
    }
}

impl Error {
    /// Wrap an arbitrary error message, substituting the generic fallback
    /// for empty strings.
    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();

        if message.trim().is_empty() {
            Error::Other(FALLBACK_MESSAGE.to_owned())
        } else {
            Error::Other(message)
        }
    }
}

impl From<TransportError> for Error {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Connection(detail) => {
                tracing::debug!("request failed before a response was received: {detail}");
                Error::Network(detail)
            }
            TransportError::Other(message) => Error::other(message),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        tracing::error!("could not decode a response body: {value}");
        Error::Decode(value.to_string())
    }
}

#[cfg(test)]
mod error_message_tests {
    use super::Error;

    #[test]
    fn network_error_uses_connectivity_message() {
        let error = Error::Network("connection refused".to_owned());

        assert_eq!(
            "Unable to reach the server. Please check your connection and try again.",
            error.to_string()
        );
    }

    #[test]
    fn status_404_uses_not_found_message() {
        assert_eq!("Resource not found.", Error::Status(404).to_string());
    }

    #[test]
    fn unknown_status_uses_generic_status_message() {
        assert_eq!(
            "Request failed with status 418",
            Error::Status(418).to_string()
        );
    }

    #[test]
    fn api_error_uses_server_message() {
        let error = Error::Api {
            status: 422,
            message: "Title is required".to_owned(),
        };

        assert_eq!("Title is required", error.to_string());
    }

    #[test]
    fn empty_other_message_uses_fallback() {
        assert_eq!(
            "Something went wrong. Please try again.",
            Error::other("  ").to_string()
        );
    }
}
