//! Server metadata
//!
//! Product info, database and layout listings, scripts, and the field and
//! value list definitions of a layout. Legacy servers expose none of these.

mod decode;
mod types;

pub(crate) use decode::{databases, layout, layouts, product_info, scripts};
pub use decode::MetadataResponse;
pub use types::{
    DatabaseName, FieldMetaData, LayoutEntry, LayoutMetadata, ProductInfo, ScriptEntry,
    ValueList, ValueListItem,
};
