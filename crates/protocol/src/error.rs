//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or mapping client input.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed event payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("unrecognized direction key {0:?}")]
    UnknownKey(String),
}
