use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const OWNER_ROLE: &str = "roles/owner";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Policy {
    pub bindings: Vec<Binding>,
}

impl Policy {
    #[must_use]
    pub const fn new(bindings: Vec<Binding>) -> Self {
        Self { bindings }
    }

    /// First binding granting `role`, if any.
    #[must_use]
    pub fn binding(&self, role: &str) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.role == role)
    }
}

/// A role-to-members association.
///
/// Keys other than `role` and `members` (for example `condition`) are carried
/// through untouched. A binding without `members` stays without them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Binding {
    #[must_use]
    pub fn new(role: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            role: role.into(),
            members,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn has_member(&self, member: &str) -> bool {
        self.members.iter().any(|candidate| candidate == member)
    }
}
