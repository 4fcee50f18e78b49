//! Query descriptors
//!
//! A [`QueryDescriptor`] describes one find, create, edit or delete against a
//! layout. It is assembled with a [`QueryBuilder`], validated once by
//! [`QueryBuilder::build`], and consumed by the client when executed.
//!
//! # Example
//!
//! ```
//! use dataapi::query::{CriteriaGroup, QueryBuilder, SortOrder};
//!
//! let query = QueryBuilder::find("Customers")
//!     .criteria(CriteriaGroup::new().matching("country", "Belgium"))
//!     .sort("name", SortOrder::Ascend)
//!     .limit(10)
//!     .build()
//!     .unwrap();
//! assert_eq!(query.criteria().len(), 1);
//! ```

mod criteria;
mod descriptor;
mod errors;

pub use criteria::{
    CriteriaGroup, PortalRequest, ScriptHook, ScriptStage, SearchCriterion, SortInstruction,
    SortOrder,
};
pub use descriptor::{Operation, QueryBuilder, QueryDescriptor, RelatedDelete};
pub use errors::{QueryError, QueryErrorCode, QueryResult};
