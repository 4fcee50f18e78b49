//! Typed record graph produced from a read reply

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

/// Data source description returned with a found set (VLatest servers)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataInfo {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub layout: String,
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub total_record_count: Option<u64>,
    #[serde(default)]
    pub found_count: Option<u64>,
    #[serde(default)]
    pub returned_count: Option<u64>,
}

/// Per-portal counts returned with each record (VLatest servers)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedSetInfo {
    #[serde(default)]
    pub portal_object_name: Option<String>,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub found_count: u64,
    #[serde(default)]
    pub returned_count: u64,
}

/// One record: flat field values plus its related record sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub(crate) record_id: Option<u64>,
    pub(crate) mod_id: Option<u64>,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) related_sets: Vec<RelatedRecordSet>,
    pub(crate) related_info: Vec<RelatedSetInfo>,
}

impl Record {
    pub fn record_id(&self) -> Option<u64> {
        self.record_id
    }

    pub fn mod_id(&self) -> Option<u64> {
        self.mod_id
    }

    /// Field values keyed by field name; related prefixes are stripped on
    /// child records
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn related_sets(&self) -> &[RelatedRecordSet] {
        &self.related_sets
    }

    /// Find a related set by owner name or by portal display name
    pub fn related(&self, name: &str) -> Option<&RelatedRecordSet> {
        self.related_sets.iter().find(|set| set.matches(name))
    }

    pub fn related_info(&self) -> &[RelatedSetInfo] {
        &self.related_info
    }
}

/// Related records reached through one portal of a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelatedRecordSet {
    pub(crate) owner_name: Option<String>,
    pub(crate) display_name: Option<String>,
    pub(crate) records: Vec<Record>,
}

impl RelatedRecordSet {
    /// Table occurrence the related fields belong to
    pub fn owner_name(&self) -> Option<&str> {
        self.owner_name.as_deref()
    }

    /// Name of the portal as keyed in the reply
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true when either name equals `name`
    pub fn matches(&self, name: &str) -> bool {
        self.owner_name.as_deref() == Some(name) || self.display_name.as_deref() == Some(name)
    }
}

/// Ordered records of one read plus aggregate counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoundSet {
    pub(crate) records: Vec<Record>,
    pub(crate) related_table_names: BTreeSet<String>,
    pub(crate) found_count: u64,
    pub(crate) returned_count: u64,
    pub(crate) total_record_count: u64,
    pub(crate) data_info: Option<DataInfo>,
}

impl FoundSet {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every owner name seen in any related set
    pub fn related_table_names(&self) -> &BTreeSet<String> {
        &self.related_table_names
    }

    pub fn found_count(&self) -> u64 {
        self.found_count
    }

    pub fn returned_count(&self) -> u64 {
        self.returned_count
    }

    pub fn total_record_count(&self) -> u64 {
        self.total_record_count
    }

    pub fn data_info(&self) -> Option<&DataInfo> {
        self.data_info.as_ref()
    }
}

impl<'a> IntoIterator for &'a FoundSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
