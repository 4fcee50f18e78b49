//! Field reference and canonical key computation

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Separator between a table occurrence and a field name
pub const OWNER_SEPARATOR: &str = "::";

/// One field value to send, or the address of one value to read.
///
/// Immutable once built; the `with_*` methods consume and return a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    name: String,
    owner: Option<String>,
    repetition: u32,
    related_record_id: Option<u64>,
    portal: Option<String>,
    value: String,
}

impl FieldRef {
    /// Create a flat field reference with a value
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            repetition: 1,
            related_record_id: None,
            portal: None,
            value: value.into(),
        }
    }

    /// Create a field reference owned by a related table occurrence
    pub fn related(
        owner: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(name, value).with_owner(owner)
    }

    /// Set the owning table occurrence. An empty owner means "no owner".
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        let owner = owner.into();
        self.owner = if owner.is_empty() { None } else { Some(owner) };
        self
    }

    /// Set the repetition. Zero is treated as the first repetition.
    pub fn with_repetition(mut self, repetition: u32) -> Self {
        self.repetition = repetition.max(1);
        self
    }

    /// Target an existing related record. Zero means a new related record.
    pub fn with_related_record(mut self, record_id: u64) -> Self {
        self.related_record_id = if record_id == 0 { None } else { Some(record_id) };
        self
    }

    /// Name of the portal object on the layout, when it differs from the owner
    pub fn with_portal(mut self, portal: impl Into<String>) -> Self {
        let portal = portal.into();
        self.portal = if portal.is_empty() { None } else { Some(portal) };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn repetition(&self) -> u32 {
        self.repetition
    }

    pub fn related_record_id(&self) -> Option<u64> {
        self.related_record_id
    }

    pub fn portal(&self) -> Option<&str> {
        self.portal.as_deref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true when the field is written through a related table
    pub fn is_related(&self) -> bool {
        self.owner.is_some()
    }

    /// Name used to group related writes: the portal object name if set,
    /// otherwise the owner.
    pub fn group_name(&self) -> Option<&str> {
        self.portal.as_deref().or(self.owner.as_deref())
    }

    /// Key used to read this field back from a server reply.
    ///
    /// Never carries a related record suffix.
    pub fn lookup_key(&self) -> String {
        let mut key = match &self.owner {
            Some(owner) => format!("{}{}{}", owner, OWNER_SEPARATOR, self.name),
            None => self.name.clone(),
        };
        if self.repetition > 1 {
            key.push_str(&format!("({})", self.repetition));
        }
        key
    }

    /// Key used when writing this field, with the related record suffix.
    pub fn wire_key(&self) -> String {
        let key = self.lookup_key();
        match self.related_record_id {
            Some(id) => format!("{}.{}", key, id),
            None => key,
        }
    }

    /// Returns the parsed form of the lookup key
    pub fn key(&self) -> FieldKey {
        FieldKey {
            owner: self.owner.clone(),
            name: self.name.clone(),
            repetition: self.repetition,
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_key())
    }
}

/// Components recovered from a lookup key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldKey {
    pub owner: Option<String>,
    pub name: String,
    pub repetition: u32,
}

fn key_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(?:(?P<owner>.+?)::)?(?P<name>.+?)(?:\((?P<rep>[0-9]+)\))?$").ok()
        })
        .as_ref()
}

impl FieldKey {
    /// Parse a lookup key such as `Orders::total(2)`.
    ///
    /// Returns None for an empty key.
    pub fn parse(key: &str) -> Option<Self> {
        let caps = key_pattern()?.captures(key)?;
        let name = caps.name("name")?.as_str().to_string();
        let owner = caps
            .name("owner")
            .map(|m| m.as_str().to_string())
            .filter(|o| !o.is_empty());
        let repetition = caps
            .name("rep")
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1);

        Some(Self {
            owner,
            name,
            repetition,
        })
    }
}

/// Split a server field name into its owner and the bare name.
///
/// `Orders::total` yields `(Some("Orders"), "total")`; `country` yields
/// `(None, "country")`.
pub fn split_qualified(field_name: &str) -> (Option<&str>, &str) {
    match field_name.split_once(OWNER_SEPARATOR) {
        Some((owner, name)) if !owner.is_empty() => (Some(owner), name),
        Some((_, name)) => (None, name),
        None => (None, field_name),
    }
}
