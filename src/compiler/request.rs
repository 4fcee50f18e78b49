//! Request Compiler
//!
//! Chooses the endpoint and encoding for a descriptor:
//!
//! 1. a record id targets the record directly (criteria ignored)
//! 2. no criteria groups gives a listing GET with parameters only
//! 3. otherwise a POST to the search endpoint carries everything in the body

use crate::field::FieldRef;
use crate::protocol::{
    FindEncoding, FindShape, PathTarget, ProtocolProfile, ProtocolResult, ServerGeneration,
};
use crate::query::{Operation, QueryDescriptor};

use super::wire::{Method, WireRequest};

/// Metadata endpoint to query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataRequest<'a> {
    ProductInfo,
    Databases,
    Layouts,
    Layout(&'a str),
    Scripts,
}

/// Compiles descriptors into wire requests for one database
#[derive(Debug, Clone)]
pub struct RequestCompiler {
    profile: ProtocolProfile,
    database: String,
}

impl RequestCompiler {
    pub fn new(generation: ServerGeneration, database: impl Into<String>) -> Self {
        Self {
            profile: ProtocolProfile::new(generation),
            database: database.into(),
        }
    }

    pub fn profile(&self) -> &ProtocolProfile {
        &self.profile
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Compile a record operation. The result carries no authorization yet.
    pub fn compile(&self, query: &QueryDescriptor) -> ProtocolResult<WireRequest> {
        let layout = query.layout();
        match query.operation() {
            Operation::Find => self.compile_find(query),
            Operation::Create => {
                let path = self.path(PathTarget::Records { layout })?;
                let body = self.profile.encode_mutation(query)?;
                Ok(WireRequest::new(Method::Post, path).with_body(body))
            }
            Operation::Edit => {
                let path = self.record_path(query)?;
                let body = self.profile.encode_mutation(query)?;
                Ok(WireRequest::new(self.profile.edit_method(), path).with_body(body))
            }
            Operation::Delete => {
                let path = self.record_path(query)?;
                let params = self.profile.encode_delete_query(query)?;
                Ok(WireRequest::new(Method::Delete, path).with_query(params))
            }
        }
    }

    fn compile_find(&self, query: &QueryDescriptor) -> ProtocolResult<WireRequest> {
        let layout = query.layout();
        let path = match FindShape::of(query) {
            FindShape::Direct(record_id) => self.path(PathTarget::Record { layout, record_id })?,
            FindShape::Listing => self.path(PathTarget::Records { layout })?,
            FindShape::Search => self.path(PathTarget::Find { layout })?,
        };
        match self.profile.encode_find(query)? {
            FindEncoding::Query(params) => Ok(WireRequest::new(Method::Get, path).with_query(params)),
            FindEncoding::Body(body) => Ok(WireRequest::new(Method::Post, path).with_body(body)),
        }
    }

    /// Set global field values. Only legacy servers address a layout.
    pub fn compile_globals(&self, layout: &str, fields: &[FieldRef]) -> ProtocolResult<WireRequest> {
        let path = self.path(PathTarget::Globals { layout })?;
        let body = self.profile.encode_globals(fields);
        Ok(WireRequest::new(self.profile.globals_method(), path).with_body(body))
    }

    pub fn compile_metadata(&self, request: MetadataRequest<'_>) -> ProtocolResult<WireRequest> {
        self.profile.check_metadata()?;
        let target = match request {
            MetadataRequest::ProductInfo => PathTarget::ProductInfo,
            MetadataRequest::Databases => PathTarget::Databases,
            MetadataRequest::Layouts => PathTarget::Layouts,
            MetadataRequest::Layout(layout) => PathTarget::Layout { layout },
            MetadataRequest::Scripts => PathTarget::Scripts,
        };
        Ok(WireRequest::new(Method::Get, self.path(target)?))
    }

    fn record_path(&self, query: &QueryDescriptor) -> ProtocolResult<String> {
        // the builder guarantees a record id on edit and delete
        let record_id = query.record_id().unwrap_or_default();
        self.path(PathTarget::Record {
            layout: query.layout(),
            record_id,
        })
    }

    fn path(&self, target: PathTarget<'_>) -> ProtocolResult<String> {
        self.profile.base_path_for(target, &self.database)
    }
}
