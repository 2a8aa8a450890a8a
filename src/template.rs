//! Desired-state template rendering.
//!
//! The organization data template is a handlebars file producing YAML: an
//! ordered list of role-binding declarations. Rendering is strict, so a
//! variable the template names but the setup file does not provide is an
//! error rather than an empty string.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};

use crate::config::SetupConfig;
use crate::error::{CliError, CliResult};
use crate::models::{Binding, RoleDefinition, RoleStage};

/// Variables exposed to the organization data template.
#[derive(Debug, Serialize)]
struct TemplateVars<'a> {
    parent: String,
    finops_group: &'a str,
    admins_group: &'a str,
    policy_group: &'a str,
    executive_group: &'a str,
    ext_adm_user: &'a str,
}

impl<'a> TemplateVars<'a> {
    fn from_config(config: &'a SetupConfig) -> Self {
        TemplateVars {
            parent: config.parent(),
            finops_group: &config.google.groups.finops_group,
            admins_group: &config.google.groups.admins_group,
            policy_group: &config.google.groups.policy_group,
            executive_group: &config.google.groups.executive_group,
            ext_adm_user: &config.google.ext_admin_user,
        }
    }
}

/// One declared role binding: a role identifier, the attributes of the role
/// when it is a custom role owned by the organization, and the principals
/// bound to it. Predefined roles carry members only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub role: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub included_permissions: Vec<String>,
    #[serde(default)]
    pub stage: Option<RoleStage>,
    #[serde(default)]
    pub members: Vec<String>,
}

impl RoleBinding {
    /// The declared role attributes, present only when the declaration
    /// carries a full custom-role definition.
    pub fn definition(&self) -> Option<RoleDefinition> {
        Some(RoleDefinition {
            title: self.title.clone()?,
            description: self.description.clone()?,
            included_permissions: self.included_permissions.clone(),
            stage: self.stage?,
        })
    }

    /// The policy binding for this declaration, dropped by the caller when
    /// the member list is empty.
    pub fn binding(&self) -> Binding {
        Binding {
            role: self.role.clone(),
            members: self.members.clone(),
        }
    }
}

/// The rendered organization data document.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgData {
    pub bindings: Vec<RoleBinding>,
}

impl OrgData {
    /// Validate the declarations against the target organization.
    ///
    /// Custom roles scoped under `parent` must carry a full definition and
    /// must not list a permission twice; every declaration needs a
    /// non-empty role identifier.
    pub fn validate(&self, parent: &str) -> CliResult<()> {
        let role_prefix = format!("{parent}/roles/");
        let mut seen_roles: HashSet<&str> = HashSet::new();

        for binding in &self.bindings {
            if binding.role.is_empty() {
                return Err(CliError::Validation(
                    "binding with empty role identifier".to_string(),
                ));
            }

            if !seen_roles.insert(binding.role.as_str()) {
                return Err(CliError::Validation(format!(
                    "role '{}' is declared more than once",
                    binding.role
                )));
            }

            if binding.role.starts_with(&role_prefix) {
                if binding.definition().is_none() {
                    return Err(CliError::Validation(format!(
                        "custom role '{}' must declare title, description and stage",
                        binding.role
                    )));
                }

                let mut seen = HashSet::new();
                for permission in &binding.included_permissions {
                    if !seen.insert(permission.as_str()) {
                        return Err(CliError::Validation(format!(
                            "custom role '{}' lists permission '{}' more than once",
                            binding.role, permission
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// The declarations naming custom roles owned by `parent`, in declared
    /// order.
    pub fn org_roles<'a>(&'a self, parent: &str) -> Vec<&'a RoleBinding> {
        let role_prefix = format!("{parent}/roles/");
        self.bindings
            .iter()
            .filter(|b| b.role.starts_with(&role_prefix))
            .collect()
    }

    /// The policy bindings: declarations with at least one member, in
    /// declared order.
    pub fn policy_bindings(&self) -> Vec<Binding> {
        self.bindings
            .iter()
            .filter(|b| !b.members.is_empty())
            .map(RoleBinding::binding)
            .collect()
    }
}

/// Render the organization data template with variables from the setup
/// config and parse the result.
pub fn render_org_data(template_src: &str, config: &SetupConfig) -> CliResult<OrgData> {
    let mut handlebars = Handlebars::new();
    // Strict mode: an unknown variable in the template is an error.
    handlebars.set_strict_mode(true);

    let rendered = handlebars
        .render_template(template_src, &TemplateVars::from_config(config))
        .map_err(|e| CliError::Template(format!("Failed to render template: {e}")))?;

    serde_yaml::from_str(&rendered).map_err(|e| {
        let location = if let Some(loc) = e.location() {
            format!(" at line {}, column {}", loc.line(), loc.column())
        } else {
            String::new()
        };
        CliError::Template(format!("Rendered template is not valid YAML{location}: {e}"))
    })
}

/// Load the template file and render it.
pub fn load_org_data(path: &Path, config: &SetupConfig) -> CliResult<OrgData> {
    if !path.exists() {
        return Err(CliError::Validation(format!(
            "Template not found: {}",
            path.display()
        )));
    }

    let template_src = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("Failed to read template {}: {}", path.display(), e)))?;

    render_org_data(&template_src, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SetupConfig {
        serde_yaml::from_str(
            r#"
google:
  organization: "123"
  billing_account: ABCDEF-012345-6789AB
  ext_admin_user: admin@external.example.com
  groups:
    finops_group: finops@example.com
    admins_group: admins@example.com
    policy_group: policy@example.com
    executive_group: exec@example.com
terraform:
  organization: example-org
  workspace_project: example-workspace
"#,
        )
        .unwrap()
    }

    const TEMPLATE: &str = r#"
bindings:
  - role: {{parent}}/roles/viewer
    title: Viewer
    description: Read-only access
    stage: GA
    includedPermissions:
      - a.get
      - b.get
    members:
      - group:{{executive_group}}
  - role: roles/billing.admin
    members:
      - group:{{finops_group}}
      - user:{{ext_adm_user}}
  - role: roles/browser
    members: []
"#;

    #[test]
    fn test_render_substitutes_variables() {
        let data = render_org_data(TEMPLATE, &config()).unwrap();
        assert_eq!(data.bindings.len(), 3);
        assert_eq!(data.bindings[0].role, "organizations/123/roles/viewer");
        assert_eq!(data.bindings[0].members, vec!["group:exec@example.com"]);
        assert_eq!(
            data.bindings[1].members,
            vec![
                "group:finops@example.com",
                "user:admin@external.example.com"
            ]
        );
    }

    #[test]
    fn test_strict_mode_rejects_unknown_variable() {
        let err = render_org_data("bindings: [{{no_such_var}}]", &config()).unwrap_err();
        assert!(err.to_string().contains("Failed to render template"));
    }

    #[test]
    fn test_rendered_yaml_must_parse() {
        let err = render_org_data("bindings: [unclosed", &config()).unwrap_err();
        assert!(err.to_string().contains("not valid YAML"));
    }

    #[test]
    fn test_validate_accepts_well_formed_data() {
        let data = render_org_data(TEMPLATE, &config()).unwrap();
        assert!(data.validate("organizations/123").is_ok());
    }

    #[test]
    fn test_validate_rejects_custom_role_without_definition() {
        let data = OrgData {
            bindings: vec![RoleBinding {
                role: "organizations/123/roles/viewer".to_string(),
                title: None,
                description: None,
                included_permissions: vec![],
                stage: None,
                members: vec![],
            }],
        };
        let err = data.validate("organizations/123").unwrap_err();
        assert!(err.to_string().contains("must declare title"));
    }

    #[test]
    fn test_validate_rejects_duplicate_permission() {
        let data = OrgData {
            bindings: vec![RoleBinding {
                role: "organizations/123/roles/viewer".to_string(),
                title: Some("Viewer".to_string()),
                description: Some("d".to_string()),
                included_permissions: vec!["a.get".to_string(), "a.get".to_string()],
                stage: Some(RoleStage::Ga),
                members: vec![],
            }],
        };
        let err = data.validate("organizations/123").unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_validate_rejects_duplicate_role_declaration() {
        let data = render_org_data(
            r#"
bindings:
  - role: roles/browser
    members: [user:a@example.com]
  - role: roles/browser
    members: [user:b@example.com]
"#,
            &config(),
        )
        .unwrap();
        let err = data.validate("organizations/123").unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_org_roles_filters_by_canonical_prefix() {
        let mut data = render_org_data(TEMPLATE, &config()).unwrap();
        // A role under a different organization sharing the numeric prefix
        // must not be selected.
        data.bindings.push(RoleBinding {
            role: "organizations/1234/roles/viewer".to_string(),
            title: Some("Other".to_string()),
            description: Some("d".to_string()),
            included_permissions: vec![],
            stage: Some(RoleStage::Ga),
            members: vec![],
        });
        let roles = data.org_roles("organizations/123");
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].role, "organizations/123/roles/viewer");
    }

    #[test]
    fn test_policy_bindings_drop_empty_members_preserving_order() {
        let data = render_org_data(TEMPLATE, &config()).unwrap();
        let bindings = data.policy_bindings();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].role, "organizations/123/roles/viewer");
        assert_eq!(bindings[1].role, "roles/billing.admin");
    }
}
