//! Client errors
//!
//! Application errors reported by the server are not here: they arrive on
//! the [`OperationOutcome`](crate::response::OperationOutcome).

use thiserror::Error;

use crate::protocol::{ProtocolError, ProtocolErrorCode};
use crate::query::QueryError;

use super::transport::TransportError;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// No reply was received
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// A reply arrived but could not be decoded
    #[error("Malformed response (status {status}): {source}")]
    MalformedResponse { status: u16, source: ProtocolError },

    /// The descriptor cannot be sent
    #[error("{0}")]
    InvalidQuery(#[from] QueryError),

    /// The server generation has no such feature
    #[error("{0}")]
    Unsupported(ProtocolError),

    #[error("Invalid client config: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub(crate) fn malformed(status: u16, source: ProtocolError) -> Self {
        ClientError::MalformedResponse { status, source }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ClientError::MalformedResponse { .. })
    }
}

/// Protocol errors raised before anything is sent
impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err.code() {
            ProtocolErrorCode::UnsupportedFeature => ClientError::Unsupported(err),
            ProtocolErrorCode::MalformedResponse => ClientError::malformed(0, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_mapping() {
        let err: ClientError = ProtocolError::unsupported("metadata", "legacy").into();
        assert!(matches!(err, ClientError::Unsupported(_)));

        let err: ClientError = ProtocolError::malformed("not JSON").into();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_display() {
        let err = ClientError::malformed(200, ProtocolError::malformed("missing \"messages\""));
        assert_eq!(
            err.to_string(),
            "Malformed response (status 200): [DATAAPI_MALFORMED_RESPONSE] missing \"messages\""
        );
        let err = ClientError::from(TransportError::Timeout);
        assert!(err.is_transport());
    }
}
