use thiserror::Error;

/// Errors raised by a [`crate::Dispatcher`] (§4.5).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Non-success transport status, propagated as-is.
    #[error("source responded with status {status}")]
    TransportStatusError { status: u16, body: String },

    /// Connect/read timeout or other transport-level I/O failure.
    #[error("transport error: {0}")]
    TransportIOError(String),
}
