//! Structured per-resource results for a reconciliation run.
//!
//! Callers and tests assert on these instead of parsing console output;
//! `--json` serializes the whole report.

use serde::{Deserialize, Serialize};

/// Action taken (or planned) for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyAction {
    /// Resource will be created
    Create,
    /// Resource exists and will be updated
    Update,
    /// Resource exists and matches the declaration
    Unchanged,
    /// Operation failed
    Failed,
}

impl ApplyAction {
    /// Returns the symbol for this action
    pub fn symbol(&self) -> &'static str {
        match self {
            ApplyAction::Create => "+",
            ApplyAction::Update => "~",
            ApplyAction::Unchanged => "=",
            ApplyAction::Failed => "✗",
        }
    }

    /// Returns the display name for this action
    pub fn display(&self) -> &'static str {
        match self {
            ApplyAction::Create => "Create",
            ApplyAction::Update => "Update",
            ApplyAction::Unchanged => "No changes",
            ApplyAction::Failed => "Failed",
        }
    }

    /// Returns the color code for this action
    pub fn color(&self) -> &'static str {
        match self {
            ApplyAction::Create => "\x1b[32m",    // Green
            ApplyAction::Update => "\x1b[33m",    // Yellow
            ApplyAction::Unchanged => "\x1b[90m", // Gray
            ApplyAction::Failed => "\x1b[31m",    // Red
        }
    }
}

/// Outcome record for one reconciled resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceChange {
    /// What action was taken
    pub action: ApplyAction,
    /// Resource type ("role" or "policy")
    pub resource_type: String,
    /// Resource name
    pub name: String,
    /// Additional info (e.g. the update mask)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Status after apply ("success", "failed", or None if pending)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResourceChange {
    pub fn create(resource_type: &str, name: &str) -> Self {
        Self {
            action: ApplyAction::Create,
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            details: None,
            status: None,
            error: None,
        }
    }

    pub fn update(resource_type: &str, name: &str, details: &str) -> Self {
        Self {
            action: ApplyAction::Update,
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            details: Some(details.to_string()),
            status: None,
            error: None,
        }
    }

    pub fn unchanged(resource_type: &str, name: &str) -> Self {
        Self {
            action: ApplyAction::Unchanged,
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            details: None,
            status: Some("success".to_string()),
            error: None,
        }
    }

    pub fn mark_success(&mut self) {
        self.status = Some("success".to_string());
    }

    pub fn mark_failed(&mut self, error: &str) {
        self.action = ApplyAction::Failed;
        self.status = Some("failed".to_string());
        self.error = Some(error.to_string());
    }
}

/// Summary counts over a set of changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl ApplySummary {
    /// Counts after applying: create/update only count on success.
    pub fn from_changes(changes: &[ResourceChange]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change.action {
                ApplyAction::Create => {
                    if change.status.as_deref() == Some("success") {
                        summary.created += 1;
                    }
                }
                ApplyAction::Update => {
                    if change.status.as_deref() == Some("success") {
                        summary.updated += 1;
                    }
                }
                ApplyAction::Unchanged => summary.unchanged += 1,
                ApplyAction::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Planned counts (before apply).
    pub fn planned(changes: &[ResourceChange]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change.action {
                ApplyAction::Create => summary.created += 1,
                ApplyAction::Update => summary.updated += 1,
                ApplyAction::Unchanged => summary.unchanged += 1,
                ApplyAction::Failed => summary.failed += 1,
            }
        }
        summary
    }

    pub fn has_changes(&self) -> bool {
        self.created > 0 || self.updated > 0
    }
}

/// Complete result of a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Per-resource changes, roles in declared order, policy last
    pub changes: Vec<ResourceChange>,
    /// Summary counts
    pub summary: ApplySummary,
}

impl ApplyReport {
    pub fn new(dry_run: bool, changes: Vec<ResourceChange>) -> Self {
        let summary = if dry_run {
            ApplySummary::planned(&changes)
        } else {
            ApplySummary::from_changes(&changes)
        };
        Self {
            dry_run,
            changes,
            summary,
        }
    }
}
