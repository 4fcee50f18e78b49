//! Query descriptor and builder

use super::criteria::{
    CriteriaGroup, PortalRequest, ScriptHook, ScriptStage, SortInstruction, SortOrder,
};
use super::errors::{QueryError, QueryResult};
use crate::field::FieldRef;

/// Operation a descriptor performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Find,
    Create,
    Edit,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Find => "find",
            Operation::Create => "create",
            Operation::Edit => "edit",
            Operation::Delete => "delete",
        }
    }

    /// Returns true for operations that write data
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Operation::Find)
    }
}

/// Deletion of one related record, carried by an edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedDelete {
    /// Relationship or portal name
    pub owner: String,
    pub record_id: u64,
}

impl RelatedDelete {
    /// Value of the `deleteRelated` pseudo-field
    pub fn wire_value(&self) -> String {
        format!("{}.{}", self.owner, self.record_id)
    }
}

/// Validated description of one operation against a layout.
///
/// Built once through [`QueryBuilder`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    operation: Operation,
    layout: String,
    record_id: Option<u64>,
    fields: Vec<FieldRef>,
    criteria: Vec<CriteriaGroup>,
    sort: Vec<SortInstruction>,
    limit: Option<u32>,
    offset: Option<u32>,
    portals: Vec<PortalRequest>,
    scripts: Vec<ScriptHook>,
    mod_id: Option<u64>,
    response_layout: Option<String>,
    delete_related: Option<RelatedDelete>,
}

impl QueryDescriptor {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    pub fn record_id(&self) -> Option<u64> {
        self.record_id
    }

    pub fn fields(&self) -> &[FieldRef] {
        &self.fields
    }

    pub fn criteria(&self) -> &[CriteriaGroup] {
        &self.criteria
    }

    pub fn sort(&self) -> &[SortInstruction] {
        &self.sort
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn offset(&self) -> Option<u32> {
        self.offset
    }

    pub fn portals(&self) -> &[PortalRequest] {
        &self.portals
    }

    /// Script hooks ordered pre-request, pre-sort, post-request
    pub fn scripts(&self) -> &[ScriptHook] {
        &self.scripts
    }

    pub fn mod_id(&self) -> Option<u64> {
        self.mod_id
    }

    pub fn response_layout(&self) -> Option<&str> {
        self.response_layout.as_deref()
    }

    pub fn delete_related(&self) -> Option<&RelatedDelete> {
        self.delete_related.as_ref()
    }

    /// Flat fields, in insertion order
    pub fn flat_fields(&self) -> impl Iterator<Item = &FieldRef> {
        self.fields.iter().filter(|f| !f.is_related())
    }

    /// Fields written through a related table occurrence, in insertion order
    pub fn related_fields(&self) -> impl Iterator<Item = &FieldRef> {
        self.fields.iter().filter(|f| f.is_related())
    }
}

/// Accumulates the parts of a [`QueryDescriptor`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    inner: QueryDescriptor,
}

impl QueryBuilder {
    fn with_operation(operation: Operation, layout: impl Into<String>, record_id: Option<u64>) -> Self {
        Self {
            inner: QueryDescriptor {
                operation,
                layout: layout.into(),
                record_id,
                fields: Vec::new(),
                criteria: Vec::new(),
                sort: Vec::new(),
                limit: None,
                offset: None,
                portals: Vec::new(),
                scripts: Vec::new(),
                mod_id: None,
                response_layout: None,
                delete_related: None,
            },
        }
    }

    /// Find records on a layout: a listing when no criteria are added,
    /// a search otherwise.
    pub fn find(layout: impl Into<String>) -> Self {
        Self::with_operation(Operation::Find, layout, None)
    }

    /// Fetch one record by its record id
    pub fn get_record(layout: impl Into<String>, record_id: u64) -> Self {
        Self::with_operation(Operation::Find, layout, Some(record_id))
    }

    /// Create a record
    pub fn create(layout: impl Into<String>) -> Self {
        Self::with_operation(Operation::Create, layout, None)
    }

    /// Edit an existing record
    pub fn edit(layout: impl Into<String>, record_id: u64) -> Self {
        Self::with_operation(Operation::Edit, layout, Some(record_id))
    }

    /// Delete a record
    pub fn delete(layout: impl Into<String>, record_id: u64) -> Self {
        Self::with_operation(Operation::Delete, layout, Some(record_id))
    }

    /// Target a single record. On a find this bypasses any criteria.
    pub fn record_id(mut self, record_id: u64) -> Self {
        self.inner.record_id = Some(record_id);
        self
    }

    /// Add a field value to write
    pub fn field(mut self, field: FieldRef) -> Self {
        self.inner.fields.push(field);
        self
    }

    /// Shorthand for a flat field value
    pub fn set(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(FieldRef::new(name, value))
    }

    /// Add a criteria group
    pub fn criteria(mut self, group: CriteriaGroup) -> Self {
        self.inner.criteria.push(group);
        self
    }

    /// Append a sort instruction after those already present
    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.inner.sort.push(SortInstruction {
            field: field.into(),
            order,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.inner.limit = Some(limit);
        self
    }

    /// 1-based offset of the first record to return
    pub fn offset(mut self, offset: u32) -> Self {
        self.inner.offset = Some(offset);
        self
    }

    /// Include a portal. A later request for the same name replaces it.
    pub fn portal(mut self, portal: PortalRequest) -> Self {
        self.inner.portals.retain(|p| p.name != portal.name);
        self.inner.portals.push(portal);
        self
    }

    /// Attach a script hook. One hook per stage; a later hook replaces it.
    pub fn script(mut self, hook: ScriptHook) -> Self {
        self.inner.scripts.retain(|s| s.stage != hook.stage);
        self.inner.scripts.push(hook);
        self.inner.scripts.sort_by_key(|s| s.stage);
        self
    }

    /// Shorthand for a script hook without parameter
    pub fn run_script(self, stage: ScriptStage, name: impl Into<String>) -> Self {
        self.script(ScriptHook::new(stage, name))
    }

    /// Expected modification id of the record being edited
    pub fn mod_id(mut self, mod_id: u64) -> Self {
        self.inner.mod_id = Some(mod_id);
        self
    }

    /// Return the found records through another layout
    pub fn response_layout(mut self, layout: impl Into<String>) -> Self {
        self.inner.response_layout = Some(layout.into());
        self
    }

    /// Delete one related record as part of an edit
    pub fn delete_related(mut self, owner: impl Into<String>, record_id: u64) -> Self {
        self.inner.delete_related = Some(RelatedDelete {
            owner: owner.into(),
            record_id,
        });
        self
    }

    /// Validate and freeze the descriptor
    pub fn build(self) -> QueryResult<QueryDescriptor> {
        let query = self.inner;

        if query.layout.is_empty() {
            return Err(QueryError::invalid_query("layout name is empty"));
        }
        if query.record_id == Some(0) {
            return Err(QueryError::invalid_query("record id must be positive"));
        }
        check_window("", query.limit, query.offset)?;
        for portal in &query.portals {
            if portal.name.is_empty() {
                return Err(QueryError::invalid_query("portal name is empty"));
            }
            check_window(&portal.name, portal.limit, portal.offset)?;
        }
        if query.criteria.iter().any(CriteriaGroup::is_empty) {
            return Err(QueryError::invalid_query("criteria group has no criteria"));
        }
        if let Some(delete) = &query.delete_related {
            if delete.owner.is_empty() || delete.record_id == 0 {
                return Err(QueryError::invalid_query(
                    "related delete needs an owner and a positive record id",
                ));
            }
        }

        let op = query.operation.as_str();
        match query.operation {
            Operation::Find => {
                if !query.fields.is_empty() {
                    return Err(QueryError::invalid_query("find does not write fields"));
                }
                if query.mod_id.is_some() || query.delete_related.is_some() {
                    return Err(QueryError::invalid_query(
                        "modification id and related deletes apply to edits only",
                    ));
                }
            }
            Operation::Create | Operation::Edit | Operation::Delete => {
                if !query.criteria.is_empty()
                    || !query.sort.is_empty()
                    || !query.portals.is_empty()
                    || query.limit.is_some()
                    || query.offset.is_some()
                    || query.response_layout.is_some()
                {
                    return Err(QueryError::invalid_query(format!(
                        "{} does not take criteria, sorting, pagination or portals",
                        op
                    )));
                }
                if query.operation != Operation::Edit
                    && (query.mod_id.is_some() || query.delete_related.is_some())
                {
                    return Err(QueryError::invalid_query(format!(
                        "{} does not take a modification id or related delete",
                        op
                    )));
                }
                if query.operation == Operation::Delete && !query.fields.is_empty() {
                    return Err(QueryError::invalid_query("delete does not write fields"));
                }
            }
        }

        Ok(query)
    }
}

fn check_window(scope: &str, limit: Option<u32>, offset: Option<u32>) -> QueryResult<()> {
    let label = if scope.is_empty() {
        String::new()
    } else {
        format!(" for portal {}", scope)
    };
    if limit == Some(0) {
        return Err(QueryError::invalid_pagination(format!(
            "limit{} must be at least 1",
            label
        )));
    }
    if offset == Some(0) {
        return Err(QueryError::invalid_pagination(format!(
            "offset{} is 1-based",
            label
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryErrorCode;

    #[test]
    fn test_find_listing() {
        let query = QueryBuilder::find("Fruit").limit(5).build().unwrap();
        assert_eq!(query.operation(), Operation::Find);
        assert!(query.criteria().is_empty());
        assert_eq!(query.limit(), Some(5));
        assert_eq!(query.offset(), None);
    }

    #[test]
    fn test_sort_order_is_kept() {
        let query = QueryBuilder::find("Fruit")
            .sort("country", SortOrder::Ascend)
            .sort("name", SortOrder::Descend)
            .build()
            .unwrap();
        let fields: Vec<_> = query.sort().iter().map(|s| s.field.as_str()).collect();
        assert_eq!(fields, vec!["country", "name"]);
    }

    #[test]
    fn test_zero_offset_rejected() {
        let err = QueryBuilder::find("Fruit").offset(0).build().unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::InvalidPagination);
    }

    #[test]
    fn test_zero_portal_limit_rejected() {
        let err = QueryBuilder::find("Fruit")
            .portal(PortalRequest::new("Orders").limit(0))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::InvalidPagination);
        assert!(err.message().contains("Orders"));
    }

    #[test]
    fn test_empty_group_rejected() {
        let err = QueryBuilder::find("Fruit")
            .criteria(CriteriaGroup::new())
            .build()
            .unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::InvalidQuery);
    }

    #[test]
    fn test_find_with_fields_rejected() {
        let result = QueryBuilder::find("Fruit").set("name", "apple").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_create_with_sort_rejected() {
        let result = QueryBuilder::create("Fruit")
            .set("name", "apple")
            .sort("name", SortOrder::Ascend)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_mod_id_only_on_edit() {
        assert!(QueryBuilder::edit("Fruit", 3).mod_id(7).build().is_ok());
        assert!(QueryBuilder::create("Fruit").mod_id(7).build().is_err());
    }

    #[test]
    fn test_record_id_on_find_keeps_criteria() {
        let query = QueryBuilder::find("Fruit")
            .criteria(CriteriaGroup::new().matching("name", "apple"))
            .record_id(4)
            .build()
            .unwrap();
        assert_eq!(query.record_id(), Some(4));
        assert_eq!(query.criteria().len(), 1);
    }

    #[test]
    fn test_script_per_stage_replaced() {
        let query = QueryBuilder::find("Fruit")
            .run_script(ScriptStage::PostRequest, "first")
            .run_script(ScriptStage::PreRequest, "before")
            .run_script(ScriptStage::PostRequest, "second")
            .build()
            .unwrap();
        let names: Vec<_> = query.scripts().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["before", "second"]);
    }

    #[test]
    fn test_flat_and_related_split() {
        let query = QueryBuilder::create("Fruit")
            .set("name", "apple")
            .field(FieldRef::related("Orders", "qty", "2"))
            .build()
            .unwrap();
        assert_eq!(query.flat_fields().count(), 1);
        assert_eq!(query.related_fields().count(), 1);
    }

    #[test]
    fn test_related_delete_value() {
        let query = QueryBuilder::edit("Fruit", 1)
            .delete_related("Orders", 2)
            .build()
            .unwrap();
        assert_eq!(query.delete_related().unwrap().wire_value(), "Orders.2");
    }
}
