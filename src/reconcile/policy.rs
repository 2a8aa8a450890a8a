//! Organization policy reconciliation: fetch the singleton document, then
//! replace it wholesale or leave it alone.

use tracing::debug;

use crate::api::{ApiError, IamClient};
use crate::models::{bindings_equal, Binding, Policy};
use crate::reconcile::ReconcileError;

/// Outcome of reconciling the organization policy.
#[derive(Debug, Clone)]
pub enum PolicyOutcome {
    /// The bindings differed; the whole list was swapped.
    Replaced(Policy),
    /// The live policy already matched the declaration.
    Unchanged(Policy),
}

/// What reconciliation would do, without doing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedPolicy {
    Replace,
    Unchanged,
}

/// Reconciles the organization's IAM policy.
///
/// The policy is fetched fresh, compared against the desired bindings
/// under canonical normalization, and on difference replaced in a single
/// write carrying the fetched etag. A stale etag fails distinctly as
/// [`ReconcileError::PolicyConflict`] rather than overwriting.
pub struct PolicyReconciler<'a> {
    client: &'a IamClient,
    parent: &'a str,
}

impl<'a> PolicyReconciler<'a> {
    pub fn new(client: &'a IamClient, parent: &'a str) -> Self {
        Self { client, parent }
    }

    /// Bring the organization policy in line with `desired`.
    pub async fn reconcile(&self, desired: &[Binding]) -> Result<PolicyOutcome, ReconcileError> {
        let live = self
            .client
            .get_iam_policy(self.parent)
            .await
            .map_err(|source| ReconcileError::PolicyFetchFailed { source })?;

        if bindings_equal(desired, &live.bindings) {
            debug!(parent = %self.parent, "policy matches declaration");
            return Ok(PolicyOutcome::Unchanged(live));
        }

        debug!(
            parent = %self.parent,
            declared = desired.len(),
            live = live.bindings.len(),
            "policy differs, replacing bindings"
        );
        let candidate = Policy::candidate(desired.to_vec(), live.etag);
        let replaced = self
            .client
            .set_iam_policy(self.parent, &candidate)
            .await
            .map_err(|source| match source {
                ApiError::Conflict(message) => ReconcileError::PolicyConflict { message },
                source => ReconcileError::PolicyUpdateFailed { source },
            })?;

        Ok(PolicyOutcome::Replaced(replaced))
    }

    /// Determine what `reconcile` would do, without mutating.
    pub async fn plan(&self, desired: &[Binding]) -> Result<PlannedPolicy, ReconcileError> {
        let live = self
            .client
            .get_iam_policy(self.parent)
            .await
            .map_err(|source| ReconcileError::PolicyFetchFailed { source })?;

        if bindings_equal(desired, &live.bindings) {
            Ok(PlannedPolicy::Unchanged)
        } else {
            Ok(PlannedPolicy::Replace)
        }
    }
}
