//! Collaborators supplied by the caller: transport and bearer tokens

use async_trait::async_trait;
use thiserror::Error;

use crate::compiler::{RawReply, WireRequest};

/// Failure to exchange a request with the server at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("TLS failure: {0}")]
    Tls(String),

    #[error("Transport failure: {0}")]
    Other(String),
}

/// Sends one wire request and returns the raw reply.
///
/// Any reply that arrived is `Ok`, whatever its status: the body decides
/// whether the operation succeeded.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: WireRequest) -> Result<RawReply, TransportError>;
}

/// Source of the bearer token attached to each call
pub trait TokenSource: Send + Sync {
    fn current_bearer_token(&self) -> String;
}

/// Fixed token, for callers that manage refresh themselves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn current_bearer_token(&self) -> String {
        self.0.clone()
    }
}

impl<F> TokenSource for F
where
    F: Fn() -> String + Send + Sync,
{
    fn current_bearer_token(&self) -> String {
        self()
    }
}
