//! Field references
//!
//! A field reference names one value sent to, or read back from, a layout.
//!
//! # Key conventions
//!
//! - `owner::name` when the field belongs to a related table occurrence
//! - `name(n)` when addressing repetition `n > 1`
//! - `.N` suffix for a related record id, outbound only
//!
//! The lookup key (no record suffix) is what the server uses in its replies;
//! the wire key is what some generations expect in writes.

mod reference;

pub use reference::{split_qualified, FieldKey, FieldRef};
