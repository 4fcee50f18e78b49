//! dataapi - request compiler and response graph builder for layout-based
//! record Data API servers
//!
//! One object model over three server generations: callers describe a find
//! or a write with a [`QueryDescriptor`](query::QueryDescriptor), the
//! [`RequestCompiler`](compiler::RequestCompiler) turns it into a
//! [`WireRequest`](compiler::WireRequest) for the selected generation, and the
//! [`ResponseGraphBuilder`](response::ResponseGraphBuilder) turns the reply
//! into a typed [`FoundSet`](response::FoundSet) and
//! [`OperationOutcome`](response::OperationOutcome).
//!
//! The crate performs no I/O. [`DataApiClient`](client::DataApiClient) ties
//! the pieces to a caller-supplied [`Transport`](client::Transport).

pub mod client;
pub mod compiler;
pub mod config;
pub mod field;
pub mod metadata;
pub mod observability;
pub mod protocol;
pub mod query;
pub mod response;

pub use client::{ClientError, ClientResult, DataApiClient, StaticToken, TokenSource, Transport};
pub use config::ClientConfig;
pub use field::FieldRef;
pub use protocol::ServerGeneration;
pub use query::{QueryBuilder, QueryDescriptor};
pub use response::{EmptyGroupPolicy, FoundSet, OperationOutcome, ReadResponse, Record};
