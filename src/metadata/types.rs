//! Server metadata shapes

use std::collections::BTreeMap;

use serde::Deserialize;

/// Data API engine description
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInfo {
    pub name: String,
    pub build_date: String,
    pub version: String,
    pub date_format: String,
    pub time_format: String,
    pub time_stamp_format: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseName {
    pub name: String,
}

/// Layout or layout folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutEntry {
    pub name: String,
    pub is_folder: bool,
    pub folder_layout_names: Vec<LayoutEntry>,
}

impl LayoutEntry {
    /// Names of all layouts in this entry, folders flattened
    pub fn layout_names(&self) -> Vec<&str> {
        if self.is_folder {
            self.folder_layout_names
                .iter()
                .flat_map(LayoutEntry::layout_names)
                .collect()
        } else {
            vec![self.name.as_str()]
        }
    }
}

/// Script or script folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptEntry {
    pub name: String,
    pub is_folder: bool,
    pub folder_script_names: Vec<ScriptEntry>,
}

impl ScriptEntry {
    pub fn script_names(&self) -> Vec<&str> {
        if self.is_folder {
            self.folder_script_names
                .iter()
                .flat_map(ScriptEntry::script_names)
                .collect()
        } else {
            vec![self.name.as_str()]
        }
    }
}

/// Definition of one field on a layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMetaData {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub display_type: String,
    pub result: String,
    pub value_list: Option<String>,
    pub global: bool,
    pub auto_enter: bool,
    pub four_digit_year: bool,
    pub max_repeat: u32,
    pub max_characters: u32,
    pub not_empty: bool,
    pub numeric: bool,
    pub time_of_day: bool,
    pub repetition_start: u32,
    pub repetition_end: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValueListItem {
    pub display_value: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValueList {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub values: Vec<ValueListItem>,
}

/// Fields, portals and value lists of one layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutMetadata {
    #[serde(rename = "fieldMetaData")]
    pub fields: Vec<FieldMetaData>,
    /// Portal object name to its fields
    #[serde(rename = "portalMetaData")]
    pub portals: BTreeMap<String, Vec<FieldMetaData>>,
    pub value_lists: Vec<ValueList>,
}

impl LayoutMetadata {
    pub fn field(&self, name: &str) -> Option<&FieldMetaData> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn value_list(&self, name: &str) -> Option<&ValueList> {
        self.value_lists.iter().find(|v| v.name == name)
    }
}
