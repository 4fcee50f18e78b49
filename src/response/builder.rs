//! Response Graph Builder
//!
//! Turns a raw reply into an [`OperationOutcome`] and, for reads, a
//! [`FoundSet`]. Application errors come back as an outcome with an empty
//! found set; only undecodable replies are errors.
//!
//! Related groups are keyed by either a table occurrence or a portal object
//! name. The builder reads the `::` prefixes of the child fields in reply
//! order to tell them apart: a prefix equal to the group key wins, otherwise
//! the first qualified field names the owner. Child fields of the owner lose
//! their prefix; fields of other occurrences keep it. When the group has no
//! qualified child field, the configured [`EmptyGroupPolicy`] decides.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::field::split_qualified;
use crate::protocol::{scalar_text, Envelope, ProtocolError, ProtocolProfile, ProtocolResult};

use super::model::{DataInfo, FoundSet, Record, RelatedRecordSet, RelatedSetInfo};
use super::outcome::{aggregate, id_member, OperationOutcome};
use super::policy::EmptyGroupPolicy;

const RECORD_ID: &str = "recordId";
const MOD_ID: &str = "modId";
const FIELD_DATA: &str = "fieldData";
const PORTAL_DATA: &str = "portalData";
const PORTAL_DATA_INFO: &str = "portalDataInfo";
const DATA_INFO: &str = "dataInfo";

/// Outcome and records of a read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResponse {
    pub outcome: OperationOutcome,
    pub found_set: FoundSet,
}

/// Builds typed results from raw replies of one protocol profile
#[derive(Debug, Clone)]
pub struct ResponseGraphBuilder {
    profile: ProtocolProfile,
    policy: EmptyGroupPolicy,
}

impl ResponseGraphBuilder {
    pub fn new(profile: ProtocolProfile, policy: EmptyGroupPolicy) -> Self {
        Self { profile, policy }
    }

    pub fn policy(&self) -> EmptyGroupPolicy {
        self.policy
    }

    /// Decode a reply carrying no records (create, edit, delete, globals)
    pub fn build_outcome(&self, raw: &str) -> ProtocolResult<OperationOutcome> {
        let envelope = self.profile.decode_envelope(raw)?;
        aggregate(&envelope)
    }

    /// Decode a read reply into its outcome and found set
    pub fn build_read(&self, raw: &str) -> ProtocolResult<ReadResponse> {
        let envelope = self.profile.decode_envelope(raw)?;
        self.build_from_envelope(&envelope)
    }

    pub fn build_from_envelope(&self, envelope: &Envelope) -> ProtocolResult<ReadResponse> {
        let outcome = aggregate(envelope)?;
        if !envelope.is_ok() {
            return Ok(ReadResponse {
                outcome,
                found_set: FoundSet::default(),
            });
        }

        let mut related_table_names = BTreeSet::new();
        let records = envelope
            .data()?
            .iter()
            .map(|node| self.parent_record(node, &mut related_table_names))
            .collect::<ProtocolResult<Vec<_>>>()?;

        let data_info = match envelope.payload.get(DATA_INFO) {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value::<DataInfo>(value.clone())
                    .map_err(|e| ProtocolError::malformed(format!("bad \"dataInfo\": {}", e)))?,
            ),
        };

        let present = records.len() as u64;
        let info = data_info.clone().unwrap_or_default();
        let found_set = FoundSet {
            found_count: info.found_count.unwrap_or(present),
            returned_count: info.returned_count.unwrap_or(present),
            total_record_count: info.total_record_count.unwrap_or(present),
            records,
            related_table_names,
            data_info,
        };

        Ok(ReadResponse { outcome, found_set })
    }

    fn parent_record(
        &self,
        node: &Value,
        related_table_names: &mut BTreeSet<String>,
    ) -> ProtocolResult<Record> {
        let node = as_object(node, "record")?;
        let mut record = Record {
            record_id: id_member(node, RECORD_ID)?,
            mod_id: id_member(node, MOD_ID)?,
            ..Record::default()
        };

        match node.get(FIELD_DATA) {
            None | Some(Value::Null) => {}
            Some(value) => {
                for (name, value) in as_object(value, FIELD_DATA)? {
                    record.fields.insert(name.clone(), field_text(value));
                }
            }
        }

        match node.get(PORTAL_DATA) {
            None | Some(Value::Null) => {}
            Some(value) => {
                for (key, rows) in as_object(value, PORTAL_DATA)? {
                    let set = self.related_set(key, rows)?;
                    if let Some(owner) = &set.owner_name {
                        related_table_names.insert(owner.clone());
                    }
                    record.related_sets.push(set);
                }
            }
        }

        if let Some(value) = node.get(PORTAL_DATA_INFO).filter(|v| !v.is_null()) {
            record.related_info = serde_json::from_value::<Vec<RelatedSetInfo>>(value.clone())
                .map_err(|e| ProtocolError::malformed(format!("bad \"portalDataInfo\": {}", e)))?;
        }

        Ok(record)
    }

    fn related_set(&self, key: &str, rows: &Value) -> ProtocolResult<RelatedRecordSet> {
        let rows = match rows {
            Value::Array(rows) => rows,
            _ => {
                return Err(ProtocolError::malformed(format!(
                    "related group \"{}\" is not an array",
                    key
                )))
            }
        };

        let rows = rows
            .iter()
            .map(|row| as_object(row, "related record"))
            .collect::<ProtocolResult<Vec<_>>>()?;
        let owner = infer_owner(key, &rows);

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut child = Record {
                record_id: id_member(row, RECORD_ID)?,
                mod_id: id_member(row, MOD_ID)?,
                ..Record::default()
            };
            for (name, value) in row {
                if name == RECORD_ID || name == MOD_ID {
                    continue;
                }
                // Only the owner's prefix is dropped; other occurrences stay qualified.
                let field_name = match split_qualified(name) {
                    (Some(prefix), bare) if Some(prefix) == owner => bare,
                    (Some(_), _) => name.as_str(),
                    (None, bare) => bare,
                };
                child.fields.insert(field_name.to_string(), field_text(value));
            }
            records.push(child);
        }

        let (owner_name, display_name) = match owner {
            Some(owner) => (Some(owner.to_string()), Some(key.to_string())),
            None => self.policy.names(key),
        };

        Ok(RelatedRecordSet {
            owner_name,
            display_name,
            records,
        })
    }
}

/// Owner of a related group, read from the `::` prefixes of its rows in
/// reply order. A prefix equal to the group key wins over earlier ones.
fn infer_owner<'a>(key: &str, rows: &[&'a Map<String, Value>]) -> Option<&'a str> {
    let mut first = None;
    for name in rows.iter().flat_map(|row| row.keys()) {
        if let (Some(prefix), _) = split_qualified(name) {
            if prefix == key {
                return Some(prefix);
            }
            first.get_or_insert(prefix);
        }
    }
    first
}

fn as_object<'a>(value: &'a Value, what: &str) -> ProtocolResult<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ProtocolError::malformed(format!("{} is not an object", what))),
    }
}

fn field_text(value: &Value) -> String {
    scalar_text(value).unwrap_or_default()
}
