//! Organization IAM policy model and binding comparison.
//!
//! The policy is a singleton document per organization, protected by an
//! etag. It is fetched fresh each run and either left alone or replaced
//! wholesale; bindings are never merged field-by-field.

use serde::{Deserialize, Serialize};

/// A role bound to a set of principal members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
}

fn policy_version() -> i32 {
    1
}

/// The organization IAM policy document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default)]
    pub etag: String,
    #[serde(default = "policy_version")]
    pub version: i32,
}

impl Policy {
    /// Build the replacement candidate: the desired bindings carrying the
    /// fetched etag for optimistic concurrency, version pinned to 1.
    pub fn candidate(bindings: Vec<Binding>, etag: String) -> Self {
        Policy {
            bindings,
            etag,
            version: 1,
        }
    }
}

/// Request body for `:setIamPolicy`.
#[derive(Debug, Clone, Serialize)]
pub struct SetPolicyRequest {
    pub policy: Policy,
}

/// Canonical form for comparison: bindings sorted by role, members sorted
/// and deduplicated. Supplier reordering must not cause a policy write.
fn normalized(bindings: &[Binding]) -> Vec<Binding> {
    let mut out: Vec<Binding> = bindings
        .iter()
        .map(|b| {
            let mut members = b.members.clone();
            members.sort();
            members.dedup();
            Binding {
                role: b.role.clone(),
                members,
            }
        })
        .collect();
    out.sort_by(|a, b| a.role.cmp(&b.role));
    out
}

/// Whether two binding lists denote the same policy content.
pub fn bindings_equal(a: &[Binding], b: &[Binding]) -> bool {
    normalized(a) == normalized(b)
}
