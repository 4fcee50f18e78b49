//! Protocol error types
//!
//! Error codes:
//! - DATAAPI_MALFORMED_RESPONSE
//! - DATAAPI_UNSUPPORTED_FEATURE

use std::fmt;

/// Protocol-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorCode {
    /// Reply body does not match the envelope of the active generation
    MalformedResponse,
    /// Requested feature does not exist in the active generation
    UnsupportedFeature,
}

impl ProtocolErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolErrorCode::MalformedResponse => "DATAAPI_MALFORMED_RESPONSE",
            ProtocolErrorCode::UnsupportedFeature => "DATAAPI_UNSUPPORTED_FEATURE",
        }
    }
}

impl fmt::Display for ProtocolErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Protocol error with context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    code: ProtocolErrorCode,
    message: String,
}

impl ProtocolError {
    /// Create a malformed response error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            code: ProtocolErrorCode::MalformedResponse,
            message: reason.into(),
        }
    }

    /// Create an unsupported feature error
    pub fn unsupported(feature: impl Into<String>, generation: impl fmt::Display) -> Self {
        Self {
            code: ProtocolErrorCode::UnsupportedFeature,
            message: format!("{} is not available on {} servers", feature.into(), generation),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ProtocolErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether the reply could not be decoded
    pub fn is_malformed(&self) -> bool {
        self.code == ProtocolErrorCode::MalformedResponse
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ProtocolError {}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_error() {
        let err = ProtocolError::malformed("not JSON");
        assert!(err.is_malformed());
        assert_eq!(err.code().code(), "DATAAPI_MALFORMED_RESPONSE");
    }

    #[test]
    fn test_unsupported_error() {
        let err = ProtocolError::unsupported("script hooks", "legacy");
        assert!(!err.is_malformed());
        assert!(err.message().contains("legacy"));
    }
}
