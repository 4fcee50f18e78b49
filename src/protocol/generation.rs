//! Server generations and their wire vocabulary

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compiler::Method;

/// Generation of the server's record API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerGeneration {
    /// Oldest REST shape, flat envelope
    Legacy,
    /// First Data API shape
    V1,
    /// Current Data API shape, adds data source info
    VLatest,
}

impl ServerGeneration {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerGeneration::Legacy => "legacy",
            ServerGeneration::V1 => "v1",
            ServerGeneration::VLatest => "vlatest",
        }
    }

    pub(crate) fn keys(&self) -> &'static WireKeys {
        match self {
            ServerGeneration::Legacy => &LEGACY_KEYS,
            ServerGeneration::V1 => &V1_KEYS,
            ServerGeneration::VLatest => &VLATEST_KEYS,
        }
    }
}

impl fmt::Display for ServerGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Envelope layout of a generation's replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnvelopeShape {
    /// `errorCode` / `errorMessage` at the top level
    Flat,
    /// `messages[]` plus a `response` object
    Messages,
}

/// Per-generation key names and capabilities
#[derive(Debug)]
pub(crate) struct WireKeys {
    pub prefix: &'static str,
    pub query_limit: &'static str,
    pub query_offset: &'static str,
    pub query_sort: &'static str,
    pub body_limit: &'static str,
    pub body_portal_limit: &'static str,
    pub field_data: &'static str,
    pub edit_method: Method,
    pub globals_method: Method,
    /// Related writes keyed `owner::name.recordId` instead of a `recordId` member
    pub related_suffix_keys: bool,
    pub scripts: bool,
    pub metadata: bool,
    pub envelope: EnvelopeShape,
}

pub(crate) const LEGACY_KEYS: WireKeys = WireKeys {
    prefix: "/fmi/rest/api/",
    query_limit: "range",
    query_offset: "offset",
    query_sort: "sort",
    body_limit: "range",
    body_portal_limit: "range",
    field_data: "data",
    edit_method: Method::Put,
    globals_method: Method::Put,
    related_suffix_keys: true,
    scripts: false,
    metadata: false,
    envelope: EnvelopeShape::Flat,
};

pub(crate) const V1_KEYS: WireKeys = WireKeys {
    prefix: "/fmi/data/v1/",
    query_limit: "_limit",
    query_offset: "_offset",
    query_sort: "_sort",
    body_limit: "limit",
    body_portal_limit: "limit",
    field_data: "fieldData",
    edit_method: Method::Patch,
    globals_method: Method::Patch,
    related_suffix_keys: false,
    scripts: true,
    metadata: true,
    envelope: EnvelopeShape::Messages,
};

pub(crate) const VLATEST_KEYS: WireKeys = WireKeys {
    prefix: "/fmi/data/vLatest/",
    ..V1_KEYS
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_serde_names() {
        let parsed: ServerGeneration = serde_json::from_str("\"vlatest\"").unwrap();
        assert_eq!(parsed, ServerGeneration::VLatest);
        assert_eq!(serde_json::to_string(&ServerGeneration::V1).unwrap(), "\"v1\"");
    }

    #[test]
    fn test_vlatest_shares_v1_vocabulary() {
        let v1 = ServerGeneration::V1.keys();
        let latest = ServerGeneration::VLatest.keys();
        assert_eq!(v1.query_limit, latest.query_limit);
        assert_ne!(v1.prefix, latest.prefix);
    }
}
