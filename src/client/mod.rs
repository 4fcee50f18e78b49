//! Client
//!
//! [`DataApiClient`] wires the request compiler and the response graph
//! builder to two collaborators the caller provides: a [`Transport`] that
//! moves bytes and a [`TokenSource`] for the bearer token. The client itself
//! performs no I/O.

mod data_api;
mod errors;
mod transport;

pub use data_api::DataApiClient;
pub use errors::{ClientError, ClientResult};
pub use transport::{StaticToken, TokenSource, Transport, TransportError};
