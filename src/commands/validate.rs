//! Check the setup file and organization data template without contacting
//! the API.

use std::path::PathBuf;

use clap::Args;

use crate::config::SetupConfig;
use crate::error::CliResult;
use crate::template;

/// Validate the setup file and template
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the setup file
    #[arg(short = 'f', long = "file", default_value = "setup.yaml")]
    pub file: PathBuf,

    /// Path to the organization data template
    #[arg(long, default_value = "orgdata.yaml.hbs")]
    pub template: PathBuf,
}

/// Execute the validate command
pub fn execute(args: ValidateArgs) -> CliResult<()> {
    let config = SetupConfig::load(&args.file)?;
    config.validate()?;
    let parent = config.parent();

    let data = template::load_org_data(&args.template, &config)?;
    data.validate(&parent)?;

    let role_count = data.org_roles(&parent).len();
    let binding_count = data.policy_bindings().len();

    println!("Configuration is valid.");
    println!("  organization:    {parent}");
    println!("  custom roles:    {role_count}");
    println!("  policy bindings: {binding_count}");

    Ok(())
}
