//! Role reconciliation: fetch, then create, patch with a minimal mask, or
//! leave untouched.

use tracing::debug;

use crate::api::IamClient;
use crate::models::{update_mask, Role, RoleDefinition, UpdateMask};
use crate::reconcile::ReconcileError;

/// Outcome of reconciling one role.
#[derive(Debug, Clone)]
pub enum RoleOutcome {
    /// The role did not exist and was created.
    Created(Role),
    /// The role existed and differed; the named fields were patched.
    Updated { role: Role, mask: UpdateMask },
    /// The role already matched the declaration.
    Unchanged(Role),
}

/// What reconciliation would do, without doing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedRole {
    Create,
    Update(UpdateMask),
    Unchanged,
}

/// Split a canonical role name into its parent path and short role id.
fn split_role_name(role_id: &str) -> Result<(&str, &str), ReconcileError> {
    role_id
        .split_once("/roles/")
        .filter(|(parent, short)| !parent.is_empty() && !short.is_empty() && !short.contains('/'))
        .ok_or_else(|| ReconcileError::InvalidRoleName {
            role: role_id.to_string(),
        })
}

/// Reconciles one custom role at a time against the live organization.
///
/// Makes exactly zero or one mutating call per invocation: a create when
/// the role is absent, a partial update when it differs, nothing when it
/// matches. Only a genuine not-found triggers creation; any other fetch
/// failure is reported as such.
pub struct RoleReconciler<'a> {
    client: &'a IamClient,
}

impl<'a> RoleReconciler<'a> {
    pub fn new(client: &'a IamClient) -> Self {
        Self { client }
    }

    /// Bring the role named by `role_id` in line with `desired`.
    pub async fn reconcile(
        &self,
        role_id: &str,
        desired: &RoleDefinition,
    ) -> Result<RoleOutcome, ReconcileError> {
        let (parent, short_name) = split_role_name(role_id)?;

        let live = match self.client.get_role(role_id).await {
            Ok(live) => live,
            Err(e) if e.is_not_found() => {
                debug!(role = %role_id, "role absent, creating");
                let created = self
                    .client
                    .create_role(parent, short_name, desired)
                    .await
                    .map_err(|source| ReconcileError::CreateFailed {
                        role: role_id.to_string(),
                        source,
                    })?;
                return Ok(RoleOutcome::Created(created));
            }
            Err(source) => {
                return Err(ReconcileError::RoleFetchFailed {
                    role: role_id.to_string(),
                    source,
                });
            }
        };

        let mask = update_mask(desired, &live);
        if mask.is_empty() {
            debug!(role = %role_id, "role matches declaration");
            return Ok(RoleOutcome::Unchanged(live));
        }

        debug!(role = %role_id, mask = %mask, "role differs, patching");
        let candidate = desired.into_candidate(&live);
        let updated = self
            .client
            .patch_role(&candidate, &mask)
            .await
            .map_err(|source| ReconcileError::UpdateFailed {
                role: role_id.to_string(),
                source,
            })?;

        Ok(RoleOutcome::Updated {
            role: updated,
            mask,
        })
    }

    /// Determine what `reconcile` would do, without mutating.
    pub async fn plan(
        &self,
        role_id: &str,
        desired: &RoleDefinition,
    ) -> Result<PlannedRole, ReconcileError> {
        split_role_name(role_id)?;

        match self.client.get_role(role_id).await {
            Ok(live) => {
                let mask = update_mask(desired, &live);
                if mask.is_empty() {
                    Ok(PlannedRole::Unchanged)
                } else {
                    Ok(PlannedRole::Update(mask))
                }
            }
            Err(e) if e.is_not_found() => Ok(PlannedRole::Create),
            Err(source) => Err(ReconcileError::RoleFetchFailed {
                role: role_id.to_string(),
                source,
            }),
        }
    }
}
