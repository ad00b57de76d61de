use std::fmt;

use serde::{Deserialize, Serialize};

use super::Quota;

/// Provider/identity pair at which quota and resources are tracked
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityRef {
    pub provider: String,
    pub identity: String,
}

impl IdentityRef {
    pub fn new(provider: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            identity: identity.into(),
        }
    }

    /// Identity named by a request path. `None` when either part is not a
    /// single plain path segment.
    pub fn from_path(provider: String, identity: String) -> Option<Self> {
        (is_plain_segment(&provider) && is_plain_segment(&identity)).then(|| Self::new(provider, identity))
    }

    /// Path segments of this identity on the cloud API
    pub fn api_segments(&self) -> [&str; 4] {
        ["provider", self.provider.as_str(), "identity", self.identity.as_str()]
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains(['/', '\\'])
}

impl fmt::Display for IdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.identity)
    }
}

/// Identity detail served at the identity endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityDetail {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub quota: Quota,
}

/// Selected identity of the signed-in user with its quota
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub identity: IdentityRef,
    pub quota: Quota,
}

impl Profile {
    pub fn new(identity: IdentityRef, quota: Quota) -> Self {
        Self { identity, quota }
    }
}

/// Identity listed in a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupIdentity {
    pub id: serde_json::Value,
    pub provider: serde_json::Value,
    #[serde(default)]
    pub name: Option<String>,
}

impl GroupIdentity {
    pub fn identity_ref(&self) -> IdentityRef {
        IdentityRef::new(id_string(&self.provider), id_string(&self.id))
    }
}

/// Group (account) with the identities it may use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub identities: Vec<GroupIdentity>,
}

/// Ids arrive either as numbers or strings
fn id_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => map.get("id").map(id_string).unwrap_or_default(),
        other => other.to_string(),
    }
}
