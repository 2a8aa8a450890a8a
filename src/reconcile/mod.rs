//! Reconciliation core: compare desired IAM state to live state and apply
//! only the minimal changes needed.
//!
//! Roles are reconciled sequentially and independently; a failing role is
//! recorded and the loop continues. The organization policy is reconciled
//! exactly once afterwards, over the declared bindings that have members.

pub mod policy;
pub mod role;

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, IamClient};
use crate::report::{ApplyReport, ResourceChange};
use crate::template::OrgData;

pub use policy::{PlannedPolicy, PolicyOutcome, PolicyReconciler};
pub use role::{PlannedRole, RoleOutcome, RoleReconciler};

/// Error from a reconciliation step, naming the resource and the action
/// that failed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The role identifier is not of the form `{parent}/roles/{id}`.
    #[error("invalid role name '{role}'")]
    InvalidRoleName { role: String },

    /// Fetching a role failed with something other than "not found".
    #[error("failed to fetch role '{role}': {source}")]
    RoleFetchFailed {
        role: String,
        #[source]
        source: ApiError,
    },

    /// Creating a role failed.
    #[error("failed to create role '{role}': {source}")]
    CreateFailed {
        role: String,
        #[source]
        source: ApiError,
    },

    /// Updating a role failed.
    #[error("failed to update role '{role}': {source}")]
    UpdateFailed {
        role: String,
        #[source]
        source: ApiError,
    },

    /// Fetching the organization policy failed. Fatal to the run.
    #[error("failed to fetch organization policy: {source}")]
    PolicyFetchFailed {
        #[source]
        source: ApiError,
    },

    /// Replacing the organization policy failed.
    #[error("failed to update organization policy: {source}")]
    PolicyUpdateFailed {
        #[source]
        source: ApiError,
    },

    /// The policy write carried a stale concurrency token.
    #[error("organization policy update conflict (stale etag): {message}")]
    PolicyConflict { message: String },
}

/// Reconcile all declared state against the live organization.
///
/// Every custom role scoped under `parent` is reconciled exactly once, in
/// declared order; per-role failures are recorded and do not stop the
/// loop. The policy step runs once afterwards over the declared bindings
/// with non-empty members. Returns a per-resource change report.
pub async fn run(client: &IamClient, parent: &str, data: &OrgData) -> ApplyReport {
    let mut changes = Vec::new();

    let role_reconciler = RoleReconciler::new(client);
    for declaration in data.org_roles(parent) {
        // Validated upstream: org-scoped declarations carry a definition.
        let Some(desired) = declaration.definition() else {
            let mut change = ResourceChange::create("role", &declaration.role);
            change.mark_failed("declaration is missing the role definition");
            changes.push(change);
            continue;
        };

        match role_reconciler.reconcile(&declaration.role, &desired).await {
            Ok(RoleOutcome::Created(_)) => {
                info!(role = %declaration.role, "role created");
                let mut change = ResourceChange::create("role", &declaration.role);
                change.mark_success();
                changes.push(change);
            }
            Ok(RoleOutcome::Updated { mask, .. }) => {
                info!(role = %declaration.role, mask = %mask, "role updated");
                let mut change =
                    ResourceChange::update("role", &declaration.role, &mask.to_query());
                change.mark_success();
                changes.push(change);
            }
            Ok(RoleOutcome::Unchanged(_)) => {
                info!(role = %declaration.role, "role up to date");
                changes.push(ResourceChange::unchanged("role", &declaration.role));
            }
            Err(e) => {
                warn!(role = %declaration.role, error = %e, "role reconciliation failed");
                let mut change = ResourceChange::create("role", &declaration.role);
                change.mark_failed(&e.to_string());
                changes.push(change);
            }
        }
    }

    let desired_bindings = data.policy_bindings();
    let policy_reconciler = PolicyReconciler::new(client, parent);
    match policy_reconciler.reconcile(&desired_bindings).await {
        Ok(PolicyOutcome::Replaced(_)) => {
            info!(parent = %parent, "organization policy replaced");
            let mut change = ResourceChange::update("policy", parent, "bindings");
            change.mark_success();
            changes.push(change);
        }
        Ok(PolicyOutcome::Unchanged(_)) => {
            info!(parent = %parent, "organization policy up to date");
            changes.push(ResourceChange::unchanged("policy", parent));
        }
        Err(e) => {
            warn!(parent = %parent, error = %e, "policy reconciliation failed");
            let mut change = ResourceChange::update("policy", parent, "bindings");
            change.mark_failed(&e.to_string());
            changes.push(change);
        }
    }

    ApplyReport::new(false, changes)
}

/// Compute the plan without mutating anything: fetch live state and record
/// what `run` would do for each resource.
pub async fn plan(client: &IamClient, parent: &str, data: &OrgData) -> ApplyReport {
    let mut changes = Vec::new();

    let role_reconciler = RoleReconciler::new(client);
    for declaration in data.org_roles(parent) {
        let Some(desired) = declaration.definition() else {
            let mut change = ResourceChange::create("role", &declaration.role);
            change.mark_failed("declaration is missing the role definition");
            changes.push(change);
            continue;
        };

        match role_reconciler.plan(&declaration.role, &desired).await {
            Ok(PlannedRole::Create) => {
                changes.push(ResourceChange::create("role", &declaration.role));
            }
            Ok(PlannedRole::Update(mask)) => {
                changes.push(ResourceChange::update(
                    "role",
                    &declaration.role,
                    &mask.to_query(),
                ));
            }
            Ok(PlannedRole::Unchanged) => {
                changes.push(ResourceChange::unchanged("role", &declaration.role));
            }
            Err(e) => {
                let mut change = ResourceChange::create("role", &declaration.role);
                change.mark_failed(&e.to_string());
                changes.push(change);
            }
        }
    }

    let desired_bindings = data.policy_bindings();
    let policy_reconciler = PolicyReconciler::new(client, parent);
    match policy_reconciler.plan(&desired_bindings).await {
        Ok(PlannedPolicy::Replace) => {
            changes.push(ResourceChange::update("policy", parent, "bindings"));
        }
        Ok(PlannedPolicy::Unchanged) => {
            changes.push(ResourceChange::unchanged("policy", parent));
        }
        Err(e) => {
            let mut change = ResourceChange::update("policy", parent, "bindings");
            change.mark_failed(&e.to_string());
            changes.push(change);
        }
    }

    ApplyReport::new(true, changes)
}
