//! Wire protocol for the three server generations
//!
//! A [`ProtocolProfile`] is built from a [`ServerGeneration`] and owns every
//! generation-specific detail: path layout, parameter names, body keys and
//! the envelope shape of replies. Nothing here performs I/O.

mod encoding;
mod envelope;
mod errors;
mod generation;
mod profile;

pub use envelope::{Envelope, ScriptErrors};
pub use errors::{ProtocolError, ProtocolErrorCode, ProtocolResult};
pub use generation::ServerGeneration;
pub use profile::{FindEncoding, FindShape, PathTarget, ProtocolProfile};

pub(crate) use envelope::scalar_text;
