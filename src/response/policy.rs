//! Naming policy for related groups with no child records

use serde::{Deserialize, Serialize};

/// How to name a related group when no child field can be inspected.
///
/// A group key can be a table occurrence or a portal object name. With no
/// child records there is nothing to tell them apart, so the caller decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyGroupPolicy {
    /// Key is both owner and display name, and counts as a related table
    KeyAsOwner,
    /// Key is the display name only; owner stays unset
    KeyAsDisplayName,
    /// Neither name is set
    Unresolved,
}

impl EmptyGroupPolicy {
    /// (owner, display) names for an uninspectable group
    pub(crate) fn names(&self, key: &str) -> (Option<String>, Option<String>) {
        match self {
            EmptyGroupPolicy::KeyAsOwner => (Some(key.to_string()), Some(key.to_string())),
            EmptyGroupPolicy::KeyAsDisplayName => (None, Some(key.to_string())),
            EmptyGroupPolicy::Unresolved => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_names() {
        assert_eq!(
            EmptyGroupPolicy::KeyAsOwner.names("Orders"),
            (Some("Orders".to_string()), Some("Orders".to_string()))
        );
        assert_eq!(
            EmptyGroupPolicy::KeyAsDisplayName.names("Orders"),
            (None, Some("Orders".to_string()))
        );
        assert_eq!(EmptyGroupPolicy::Unresolved.names("Orders"), (None, None));
    }

    #[test]
    fn test_policy_serde() {
        let policy: EmptyGroupPolicy = serde_json::from_str("\"key_as_display_name\"").unwrap();
        assert_eq!(policy, EmptyGroupPolicy::KeyAsDisplayName);
    }
}
