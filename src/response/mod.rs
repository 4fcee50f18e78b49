//! Response graph
//!
//! Decoded replies: the [`FoundSet`] record graph for reads and the
//! [`OperationOutcome`] every call produces.

mod builder;
mod model;
mod outcome;
mod policy;

pub use builder::{ReadResponse, ResponseGraphBuilder};
pub use model::{DataInfo, FoundSet, Record, RelatedRecordSet, RelatedSetInfo};
pub use outcome::{aggregate, OperationOutcome};
pub use policy::EmptyGroupPolicy;
