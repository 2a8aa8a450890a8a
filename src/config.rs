//! Setup file loading and validation.
//!
//! The setup file names the target organization, the billing account, the
//! external admin user, and the Google groups that receive standing role
//! bindings, plus the Terraform workspace coordinates used by later
//! bootstrap stages.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Root setup configuration, loaded from `setup.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupConfig {
    pub google: GoogleConfig,
    pub terraform: TerraformConfig,
    /// Per-call timeout for remote API requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Google organization coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Numeric organization ID.
    pub organization: String,
    pub billing_account: String,
    /// External admin account kept outside the organization's identity
    /// domain, bound as a break-glass principal.
    pub ext_admin_user: String,
    pub groups: GroupsConfig,
}

/// Google groups granted standing bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupsConfig {
    pub finops_group: String,
    pub admins_group: String,
    pub policy_group: String,
    pub executive_group: String,
}

/// Terraform workspace coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformConfig {
    pub organization: String,
    pub workspace_project: String,
}

impl SetupConfig {
    /// Load and parse the setup file.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Err(CliError::Validation(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CliError::Io(format!("Failed to read file {}: {}", path.display(), e)))?;

        serde_yaml::from_str(&content).map_err(|e| {
            let location = if let Some(loc) = e.location() {
                format!(" at line {}, column {}", loc.line(), loc.column())
            } else {
                String::new()
            };
            CliError::Validation(format!("Invalid YAML{location}: {e}"))
        })
    }

    /// Validate field contents beyond what deserialization enforces.
    pub fn validate(&self) -> CliResult<()> {
        if self.google.organization.is_empty()
            || !self.google.organization.chars().all(|c| c.is_ascii_digit())
        {
            return Err(CliError::Validation(format!(
                "google.organization must be a numeric organization ID, got '{}'",
                self.google.organization
            )));
        }

        if self.google.billing_account.is_empty() {
            return Err(CliError::Validation(
                "google.billing_account must not be empty".to_string(),
            ));
        }

        for (field, value) in [
            ("google.ext_admin_user", &self.google.ext_admin_user),
            ("google.groups.finops_group", &self.google.groups.finops_group),
            ("google.groups.admins_group", &self.google.groups.admins_group),
            ("google.groups.policy_group", &self.google.groups.policy_group),
            (
                "google.groups.executive_group",
                &self.google.groups.executive_group,
            ),
        ] {
            if !value.contains('@') {
                return Err(CliError::Validation(format!(
                    "{field} must be an email address, got '{value}'"
                )));
            }
        }

        if self.terraform.organization.is_empty() || self.terraform.workspace_project.is_empty() {
            return Err(CliError::Validation(
                "terraform.organization and terraform.workspace_project must not be empty"
                    .to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(CliError::Validation(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Canonical organization resource path, `organizations/{org_id}`.
    pub fn parent(&self) -> String {
        format!("organizations/{}", self.google.organization)
    }
}
