//! Custom role data model and update-mask diffing.
//!
//! `Role` mirrors the IAM API wire shape (camelCase, etag-protected);
//! `RoleDefinition` holds the declared attributes. The update mask is
//! computed from a fixed table of per-attribute equality functions so each
//! comparison is independently testable.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Launch stage of a custom role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleStage {
    Alpha,
    Beta,
    Ga,
    Deprecated,
    Disabled,
    Eol,
}

impl Default for RoleStage {
    // The API reports ALPHA when a role was created without a stage.
    fn default() -> Self {
        RoleStage::Alpha
    }
}

impl fmt::Display for RoleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoleStage::Alpha => "ALPHA",
            RoleStage::Beta => "BETA",
            RoleStage::Ga => "GA",
            RoleStage::Deprecated => "DEPRECATED",
            RoleStage::Disabled => "DISABLED",
            RoleStage::Eol => "EOL",
        };
        f.write_str(s)
    }
}

/// A custom role as it exists on the organization.
///
/// `etag` changes on every successful mutation and must be carried back on
/// updates. `name` is the canonical `organizations/{org}/roles/{id}` path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub included_permissions: Vec<String>,
    #[serde(default)]
    pub stage: RoleStage,
    #[serde(default)]
    pub etag: String,
}

/// Declared attributes of a custom role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDefinition {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub included_permissions: Vec<String>,
    pub stage: RoleStage,
}

impl RoleDefinition {
    /// Merge these attributes with a live role's identity fields to form the
    /// full candidate record submitted on update.
    pub fn into_candidate(&self, live: &Role) -> Role {
        Role {
            name: live.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            included_permissions: self.included_permissions.clone(),
            stage: self.stage,
            etag: live.etag.clone(),
        }
    }
}

/// Request body for role creation: the short role id plus the definition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    pub role_id: String,
    pub role: RoleDefinition,
}

/// The attribute names whose values differ between a definition and a live
/// role, in canonical order. Drives the `updateMask` query parameter of a
/// partial update; an empty mask must never be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMask {
    fields: Vec<&'static str>,
}

impl UpdateMask {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    /// Comma-joined form used as the `updateMask` query parameter.
    pub fn to_query(&self) -> String {
        self.fields.join(",")
    }
}

impl fmt::Display for UpdateMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query())
    }
}

/// Whether two permission lists denote the same set, ignoring order and
/// repeated entries.
pub fn permission_sets_equal(a: &[String], b: &[String]) -> bool {
    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}

/// Fixed diff table: attribute name paired with its equality function.
/// Scalar fields compare exactly; permissions compare as sets.
const ROLE_DIFF_TABLE: &[(&str, fn(&RoleDefinition, &Role) -> bool)] = &[
    ("description", |d, l| d.description == l.description),
    ("includedPermissions", |d, l| {
        permission_sets_equal(&d.included_permissions, &l.included_permissions)
    }),
    ("stage", |d, l| d.stage == l.stage),
    ("title", |d, l| d.title == l.title),
];

/// Compute the minimal update mask between a declared definition and the
/// live role. Every entry names an attribute whose values are unequal.
pub fn update_mask(desired: &RoleDefinition, live: &Role) -> UpdateMask {
    let fields = ROLE_DIFF_TABLE
        .iter()
        .filter(|(_, eq)| !eq(desired, live))
        .map(|(name, _)| *name)
        .collect();
    UpdateMask { fields }
}
