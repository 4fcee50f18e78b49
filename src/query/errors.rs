//! Query descriptor error types
//!
//! Error codes:
//! - DATAAPI_INVALID_QUERY
//! - DATAAPI_INVALID_PAGINATION

use std::fmt;

/// Query-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    /// Descriptor is inconsistent with its operation
    InvalidQuery,
    /// Limit or offset outside the allowed range
    InvalidPagination,
}

impl QueryErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::InvalidQuery => "DATAAPI_INVALID_QUERY",
            QueryErrorCode::InvalidPagination => "DATAAPI_INVALID_PAGINATION",
        }
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error raised while building a query descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    code: QueryErrorCode,
    message: String,
}

impl QueryError {
    /// Create an invalid query error
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::InvalidQuery,
            message: reason.into(),
        }
    }

    /// Create an invalid pagination error
    pub fn invalid_pagination(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::InvalidPagination,
            message: reason.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for QueryError {}

/// Result type for query building
pub type QueryResult<T> = Result<T, QueryError>;
