//! Protocol profile: one parameterized mapping for all server generations
//!
//! The profile turns a [`QueryDescriptor`] into paths, query strings and JSON
//! bodies, and turns a raw reply into an [`Envelope`]. Differences between
//! generations live in the [`WireKeys`] table selected at construction.

use serde_json::{json, Map, Value};

use super::encoding::{segment, QueryString};
use super::envelope::{self, Envelope};
use super::errors::{ProtocolError, ProtocolResult};
use super::generation::{ServerGeneration, WireKeys};
use crate::compiler::Method;
use crate::field::FieldRef;
use crate::query::{Operation, QueryDescriptor, ScriptHook};

/// Endpoint a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTarget<'a> {
    /// Record collection of a layout: listing and create
    Records { layout: &'a str },
    /// One record of a layout
    Record { layout: &'a str, record_id: u64 },
    /// Search endpoint of a layout
    Find { layout: &'a str },
    /// Global field values
    Globals { layout: &'a str },
    ProductInfo,
    Databases,
    Layouts,
    Layout { layout: &'a str },
    Scripts,
}

/// How a find descriptor reaches the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindShape {
    /// Direct GET of one record; criteria are ignored
    Direct(u64),
    /// GET of the record collection with parameters only
    Listing,
    /// POST of criteria groups to the search endpoint
    Search,
}

impl FindShape {
    pub fn of(query: &QueryDescriptor) -> Self {
        match query.record_id() {
            Some(id) => FindShape::Direct(id),
            None if query.criteria().is_empty() => FindShape::Listing,
            None => FindShape::Search,
        }
    }
}

/// Encoded find: query string for GET paths, JSON body for searches
#[derive(Debug, Clone, PartialEq)]
pub enum FindEncoding {
    Query(Option<String>),
    Body(Value),
}

/// Wire mapping for one server generation
#[derive(Debug, Clone, Copy)]
pub struct ProtocolProfile {
    generation: ServerGeneration,
    keys: &'static WireKeys,
}

impl ProtocolProfile {
    pub fn new(generation: ServerGeneration) -> Self {
        Self {
            generation,
            keys: generation.keys(),
        }
    }

    pub fn generation(&self) -> ServerGeneration {
        self.generation
    }

    /// Method used for edits (PUT on legacy servers, PATCH otherwise)
    pub fn edit_method(&self) -> Method {
        self.keys.edit_method
    }

    /// Method used to set global fields
    pub fn globals_method(&self) -> Method {
        self.keys.globals_method
    }

    /// Absolute URL path for an endpoint
    pub fn base_path_for(&self, target: PathTarget<'_>, database: &str) -> ProtocolResult<String> {
        let db = segment(database);
        let relative = match (self.generation, target) {
            (ServerGeneration::Legacy, PathTarget::Records { layout }) => {
                format!("record/{}/{}", db, segment(layout))
            }
            (ServerGeneration::Legacy, PathTarget::Record { layout, record_id }) => {
                format!("record/{}/{}/{}", db, segment(layout), record_id)
            }
            (ServerGeneration::Legacy, PathTarget::Find { layout }) => {
                format!("find/{}/{}", db, segment(layout))
            }
            (ServerGeneration::Legacy, PathTarget::Globals { layout }) => {
                format!("global/{}/{}", db, segment(layout))
            }
            (ServerGeneration::Legacy, _) => {
                return Err(ProtocolError::unsupported("metadata", self.generation))
            }
            (_, PathTarget::Records { layout }) => {
                format!("databases/{}/layouts/{}/records", db, segment(layout))
            }
            (_, PathTarget::Record { layout, record_id }) => format!(
                "databases/{}/layouts/{}/records/{}",
                db,
                segment(layout),
                record_id
            ),
            (_, PathTarget::Find { layout }) => {
                format!("databases/{}/layouts/{}/_find", db, segment(layout))
            }
            (_, PathTarget::Globals { .. }) => format!("databases/{}/globals", db),
            (_, PathTarget::ProductInfo) => "productInfo".to_string(),
            (_, PathTarget::Databases) => "databases".to_string(),
            (_, PathTarget::Layouts) => format!("databases/{}/layouts", db),
            (_, PathTarget::Layout { layout }) => {
                format!("databases/{}/layouts/{}", db, segment(layout))
            }
            (_, PathTarget::Scripts) => format!("databases/{}/scripts", db),
        };
        Ok(format!("{}{}", self.keys.prefix, relative))
    }

    /// Encode a find descriptor according to its [`FindShape`]
    pub fn encode_find(&self, query: &QueryDescriptor) -> ProtocolResult<FindEncoding> {
        self.check_scripts(query.scripts())?;
        match FindShape::of(query) {
            FindShape::Direct(_) => Ok(FindEncoding::Query(self.encode_record_query(query))),
            FindShape::Listing => Ok(FindEncoding::Query(self.encode_listing_query(query))),
            FindShape::Search => Ok(FindEncoding::Body(self.encode_search_body(query))),
        }
    }

    /// Query string of a direct record GET: portals, scripts, response layout
    fn encode_record_query(&self, query: &QueryDescriptor) -> Option<String> {
        let mut qs = QueryString::new();
        self.push_common_params(&mut qs, query);
        qs.finish()
    }

    /// Query string of a listing GET
    fn encode_listing_query(&self, query: &QueryDescriptor) -> Option<String> {
        let mut qs = QueryString::new();
        self.push_common_params(&mut qs, query);

        if !query.sort().is_empty() {
            qs.push(self.keys.query_sort, &self.sort_value(query).to_string());
        }
        if let Some(limit) = query.limit() {
            qs.push(self.keys.query_limit, &limit.to_string());
        }
        if let Some(offset) = query.offset() {
            qs.push(self.keys.query_offset, &offset.to_string());
        }
        qs.finish()
    }

    fn push_common_params(&self, qs: &mut QueryString, query: &QueryDescriptor) {
        if !query.portals().is_empty() {
            let names: Vec<&str> = query.portals().iter().map(|p| p.name.as_str()).collect();
            qs.push("portal", &Value::from(names).to_string());
            for portal in query.portals() {
                if let Some(offset) = portal.offset {
                    qs.push(
                        &format!("{}.{}", self.keys.query_offset, portal.name),
                        &offset.to_string(),
                    );
                }
            }
            for portal in query.portals() {
                if let Some(limit) = portal.limit {
                    qs.push(
                        &format!("{}.{}", self.keys.query_limit, portal.name),
                        &limit.to_string(),
                    );
                }
            }
        }
        for hook in query.scripts() {
            for (key, value) in hook.wire_pairs() {
                qs.push(key, value);
            }
        }
        if let Some(layout) = query.response_layout() {
            qs.push("layout.response", layout);
        }
    }

    /// JSON body of a search: criteria plus every other parameter
    fn encode_search_body(&self, query: &QueryDescriptor) -> Value {
        let mut body = Map::new();

        let groups: Vec<Value> = query
            .criteria()
            .iter()
            .map(|group| {
                let mut object = Map::new();
                for criterion in group.criteria() {
                    object.insert(criterion.field.clone(), Value::from(criterion.pattern.as_str()));
                }
                if group.is_omit() {
                    object.insert("omit".to_string(), Value::from("true"));
                }
                Value::Object(object)
            })
            .collect();
        body.insert("query".to_string(), Value::Array(groups));

        if !query.sort().is_empty() {
            body.insert("sort".to_string(), self.sort_value(query));
        }
        if let Some(limit) = query.limit() {
            body.insert(self.keys.body_limit.to_string(), Value::from(limit.to_string()));
        }
        if let Some(offset) = query.offset() {
            body.insert("offset".to_string(), Value::from(offset.to_string()));
        }
        if let Some(layout) = query.response_layout() {
            body.insert("layout.response".to_string(), Value::from(layout));
        }
        if !query.portals().is_empty() {
            let names: Vec<&str> = query.portals().iter().map(|p| p.name.as_str()).collect();
            body.insert("portal".to_string(), Value::from(names));
            for portal in query.portals() {
                if let Some(limit) = portal.limit {
                    body.insert(
                        format!("{}.{}", self.keys.body_portal_limit, portal.name),
                        Value::from(limit),
                    );
                }
                if let Some(offset) = portal.offset {
                    body.insert(format!("offset.{}", portal.name), Value::from(offset));
                }
            }
        }
        insert_scripts(&mut body, query.scripts());

        Value::Object(body)
    }

    /// Sort array: one `{fieldName, sortOrder}` object per sort, in order
    fn sort_value(&self, query: &QueryDescriptor) -> Value {
        query
            .sort()
            .iter()
            .map(|s| json!({ "fieldName": s.field, "sortOrder": s.order.as_wire() }))
            .collect()
    }

    /// JSON body for a create or edit.
    ///
    /// Flat fields go under the field data key; related fields are grouped by
    /// portal (or owner) name under `portalData`, one object per related row.
    pub fn encode_mutation(&self, query: &QueryDescriptor) -> ProtocolResult<Value> {
        self.check_scripts(query.scripts())?;

        let mut field_data = Map::new();
        for field in query.flat_fields() {
            field_data.insert(field.wire_key(), Value::from(field.value()));
        }
        if let Some(delete) = query.delete_related() {
            field_data.insert("deleteRelated".to_string(), Value::from(delete.wire_value()));
        }

        let mut body = Map::new();
        body.insert(self.keys.field_data.to_string(), Value::Object(field_data));

        let portal_data = self.related_rows(query.related_fields());
        if !portal_data.is_empty() {
            body.insert("portalData".to_string(), Value::Object(portal_data));
        }

        if query.operation() == Operation::Edit {
            if let Some(mod_id) = query.mod_id() {
                body.insert("modId".to_string(), Value::from(mod_id.to_string()));
            }
        }
        insert_scripts(&mut body, query.scripts());

        Ok(Value::Object(body))
    }

    fn related_rows<'a>(&self, fields: impl Iterator<Item = &'a FieldRef>) -> Map<String, Value> {
        // (group, related record id, row) in first-seen order
        let mut rows: Vec<(String, Option<u64>, Map<String, Value>)> = Vec::new();

        for field in fields {
            let group = match field.group_name() {
                Some(group) => group.to_string(),
                None => continue,
            };
            let record_id = field.related_record_id();
            let position = rows
                .iter()
                .position(|(g, id, _)| *g == group && *id == record_id);
            let index = match position {
                Some(index) => index,
                None => {
                    let mut row = Map::new();
                    if let (Some(id), false) = (record_id, self.keys.related_suffix_keys) {
                        row.insert("recordId".to_string(), Value::from(id.to_string()));
                    }
                    rows.push((group, record_id, row));
                    rows.len() - 1
                }
            };
            let key = if self.keys.related_suffix_keys {
                field.wire_key()
            } else {
                field.lookup_key()
            };
            rows[index].2.insert(key, Value::from(field.value()));
        }

        let mut portal_data = Map::new();
        for (group, _, row) in rows {
            let entry = portal_data
                .entry(group)
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(Value::Object(row));
            }
        }
        portal_data
    }

    /// Query string of a delete: script hooks only
    pub fn encode_delete_query(&self, query: &QueryDescriptor) -> ProtocolResult<Option<String>> {
        self.check_scripts(query.scripts())?;
        let mut qs = QueryString::new();
        for hook in query.scripts() {
            for (key, value) in hook.wire_pairs() {
                qs.push(key, value);
            }
        }
        Ok(qs.finish())
    }

    /// JSON body setting global fields, keyed by lookup key
    pub fn encode_globals(&self, fields: &[FieldRef]) -> Value {
        let globals: Map<String, Value> = fields
            .iter()
            .map(|f| (f.lookup_key(), Value::from(f.value())))
            .collect();
        json!({ "globalFields": globals })
    }

    /// Decode a raw reply into the normalized envelope
    pub fn decode_envelope(&self, raw: &str) -> ProtocolResult<Envelope> {
        envelope::decode(self.keys.envelope, raw)
    }

    /// Fails when metadata endpoints do not exist on this generation
    pub fn check_metadata(&self) -> ProtocolResult<()> {
        if self.keys.metadata {
            Ok(())
        } else {
            Err(ProtocolError::unsupported("metadata", self.generation))
        }
    }

    fn check_scripts(&self, scripts: &[ScriptHook]) -> ProtocolResult<()> {
        if scripts.is_empty() || self.keys.scripts {
            Ok(())
        } else {
            Err(ProtocolError::unsupported("script hooks", self.generation))
        }
    }
}

fn insert_scripts(body: &mut Map<String, Value>, scripts: &[ScriptHook]) {
    for hook in scripts {
        for (key, value) in hook.wire_pairs() {
            body.insert(key.to_string(), Value::from(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{CriteriaGroup, PortalRequest, QueryBuilder, ScriptStage, SortOrder};

    fn v1() -> ProtocolProfile {
        ProtocolProfile::new(ServerGeneration::V1)
    }

    fn legacy() -> ProtocolProfile {
        ProtocolProfile::new(ServerGeneration::Legacy)
    }

    #[test]
    fn test_paths_per_generation() {
        let target = PathTarget::Record {
            layout: "Fruit List",
            record_id: 7,
        };
        assert_eq!(
            v1().base_path_for(target, "Shop").unwrap(),
            "/fmi/data/v1/databases/Shop/layouts/Fruit%20List/records/7"
        );
        assert_eq!(
            ProtocolProfile::new(ServerGeneration::VLatest)
                .base_path_for(PathTarget::Find { layout: "Fruit" }, "Shop")
                .unwrap(),
            "/fmi/data/vLatest/databases/Shop/layouts/Fruit/_find"
        );
        assert_eq!(
            legacy().base_path_for(target, "Shop").unwrap(),
            "/fmi/rest/api/record/Shop/Fruit%20List/7"
        );
        assert_eq!(
            legacy()
                .base_path_for(PathTarget::Find { layout: "Fruit" }, "Shop")
                .unwrap(),
            "/fmi/rest/api/find/Shop/Fruit"
        );
    }

    #[test]
    fn test_legacy_has_no_metadata() {
        assert!(legacy().base_path_for(PathTarget::Scripts, "Shop").is_err());
        assert!(legacy().check_metadata().is_err());
        assert!(v1().check_metadata().is_ok());
    }

    #[test]
    fn test_listing_query_v1() {
        let query = QueryBuilder::find("Fruit")
            .sort("name", SortOrder::Descend)
            .limit(10)
            .offset(21)
            .build()
            .unwrap();
        let encoded = v1().encode_find(&query).unwrap();
        let expected = "_sort=%5B%7B%22fieldName%22%3A%22name%22%2C%22sortOrder%22%3A%22descend%22%7D%5D&_limit=10&_offset=21";
        assert_eq!(encoded, FindEncoding::Query(Some(expected.to_string())));
    }

    #[test]
    fn test_sort_array_keeps_order_and_value_lists() {
        let query = QueryBuilder::find("Fruit")
            .criteria(CriteriaGroup::new().matching("country", "Belgium"))
            .sort("size", SortOrder::ValueList("Sizes".to_string()))
            .sort("name", SortOrder::Descend)
            .build()
            .unwrap();
        match v1().encode_find(&query).unwrap() {
            FindEncoding::Body(body) => assert_eq!(
                body["sort"],
                json!([
                    {"fieldName": "size", "sortOrder": "Sizes"},
                    {"fieldName": "name", "sortOrder": "descend"}
                ])
            ),
            other => panic!("expected body, got {:?}", other),
        }
    }

    #[test]
    fn test_listing_query_legacy_names() {
        let query = QueryBuilder::find("Fruit").limit(5).offset(2).build().unwrap();
        let encoded = legacy().encode_find(&query).unwrap();
        assert_eq!(encoded, FindEncoding::Query(Some("range=5&offset=2".to_string())));
    }

    #[test]
    fn test_listing_without_parameters_has_no_query() {
        let query = QueryBuilder::find("Fruit").build().unwrap();
        assert_eq!(v1().encode_find(&query).unwrap(), FindEncoding::Query(None));
    }

    #[test]
    fn test_portal_window_in_query() {
        let query = QueryBuilder::find("Fruit")
            .portal(PortalRequest::new("Orders").limit(5).offset(2))
            .build()
            .unwrap();
        let encoded = v1().encode_find(&query).unwrap();
        assert_eq!(
            encoded,
            FindEncoding::Query(Some(
                "portal=%5B%22Orders%22%5D&_offset.Orders=2&_limit.Orders=5".to_string()
            ))
        );
    }

    #[test]
    fn test_search_body() {
        let query = QueryBuilder::find("Fruit")
            .criteria(CriteriaGroup::new().matching("country", "Belgium"))
            .criteria(CriteriaGroup::new().omitting("name", "apple"))
            .sort("name", SortOrder::Ascend)
            .limit(10)
            .portal(PortalRequest::new("Orders").limit(3))
            .script(ScriptHook::new(ScriptStage::PreRequest, "prep").with_parameter("x"))
            .build()
            .unwrap();
        let encoded = v1().encode_find(&query).unwrap();
        assert_eq!(
            encoded,
            FindEncoding::Body(json!({
                "query": [{"country": "Belgium"}, {"name": "apple", "omit": "true"}],
                "sort": [{"fieldName": "name", "sortOrder": "ascend"}],
                "limit": "10",
                "portal": ["Orders"],
                "limit.Orders": 3,
                "script.prerequest": "prep",
                "script.prerequest.param": "x"
            }))
        );
    }

    #[test]
    fn test_legacy_search_uses_range() {
        let query = QueryBuilder::find("Fruit")
            .criteria(CriteriaGroup::new().matching("country", "Belgium"))
            .limit(10)
            .offset(3)
            .build()
            .unwrap();
        match legacy().encode_find(&query).unwrap() {
            FindEncoding::Body(body) => {
                assert_eq!(body["range"], "10");
                assert_eq!(body["offset"], "3");
                assert!(body.get("limit").is_none());
            }
            other => panic!("expected body, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_rejects_scripts() {
        let query = QueryBuilder::find("Fruit")
            .run_script(ScriptStage::PostRequest, "log")
            .build()
            .unwrap();
        let err = legacy().encode_find(&query).unwrap_err();
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_direct_query_ignores_sort_and_limit() {
        let query = QueryBuilder::get_record("Fruit", 9)
            .sort("name", SortOrder::Ascend)
            .limit(4)
            .response_layout("Fruit Detail")
            .build()
            .unwrap();
        assert_eq!(
            v1().encode_find(&query).unwrap(),
            FindEncoding::Query(Some("layout.response=Fruit%20Detail".to_string()))
        );
    }

    #[test]
    fn test_mutation_flat_and_related() {
        let query = QueryBuilder::create("Cake")
            .set("name", "Tart")
            .field(FieldRef::related("Fruit", "kind", "cherry"))
            .build()
            .unwrap();
        let body = v1().encode_mutation(&query).unwrap();
        assert_eq!(
            body,
            json!({
                "fieldData": {"name": "Tart"},
                "portalData": {"Fruit": [{"Fruit::kind": "cherry"}]}
            })
        );
    }

    #[test]
    fn test_mutation_related_rows_grouped_by_record() {
        let query = QueryBuilder::edit("Cake", 1)
            .field(FieldRef::related("Fruit", "kind", "pear").with_related_record(4))
            .field(FieldRef::related("Fruit", "qty", "2").with_related_record(4))
            .field(FieldRef::related("Fruit", "kind", "fig"))
            .mod_id(6)
            .build()
            .unwrap();
        let body = v1().encode_mutation(&query).unwrap();
        assert_eq!(
            body,
            json!({
                "fieldData": {},
                "portalData": {"Fruit": [
                    {"recordId": "4", "Fruit::kind": "pear", "Fruit::qty": "2"},
                    {"Fruit::kind": "fig"}
                ]},
                "modId": "6"
            })
        );
    }

    #[test]
    fn test_legacy_mutation_uses_suffix_keys() {
        let query = QueryBuilder::edit("Cake", 1)
            .set("name", "Pie")
            .field(
                FieldRef::related("Fruit", "kind", "pear")
                    .with_related_record(4)
                    .with_portal("FruitPortal"),
            )
            .build()
            .unwrap();
        let body = legacy().encode_mutation(&query).unwrap();
        assert_eq!(
            body,
            json!({
                "data": {"name": "Pie"},
                "portalData": {"FruitPortal": [{"Fruit::kind.4": "pear"}]}
            })
        );
    }

    #[test]
    fn test_delete_related_in_field_data() {
        let query = QueryBuilder::edit("Cake", 1)
            .delete_related("Fruit", 3)
            .build()
            .unwrap();
        let body = v1().encode_mutation(&query).unwrap();
        assert_eq!(body["fieldData"]["deleteRelated"], "Fruit.3");
    }

    #[test]
    fn test_delete_query_scripts() {
        let query = QueryBuilder::delete("Cake", 1)
            .script(ScriptHook::new(ScriptStage::PostRequest, "audit").with_parameter("gone"))
            .build()
            .unwrap();
        assert_eq!(
            v1().encode_delete_query(&query).unwrap().as_deref(),
            Some("script=audit&script.param=gone")
        );
    }

    #[test]
    fn test_globals_body() {
        let fields = [
            FieldRef::related("Settings", "theme", "dark"),
            FieldRef::related("Settings", "slots", "4").with_repetition(2),
        ];
        assert_eq!(
            v1().encode_globals(&fields),
            json!({"globalFields": {"Settings::theme": "dark", "Settings::slots(2)": "4"}})
        );
    }
}
