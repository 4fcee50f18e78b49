//! Request compilation
//!
//! Combines a [`QueryDescriptor`](crate::query::QueryDescriptor) with the
//! selected protocol profile into one [`WireRequest`].

mod request;
mod wire;

pub use request::{MetadataRequest, RequestCompiler};
pub use wire::{Method, RawReply, WireRequest};
