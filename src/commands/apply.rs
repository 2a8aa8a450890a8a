//! Apply declared organization IAM state.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use dialoguer::Confirm;

use crate::api::{Credentials, IamClient};
use crate::config::SetupConfig;
use crate::error::{CliError, CliResult};
use crate::reconcile;
use crate::report::{ApplyAction, ApplyReport};
use crate::template;

/// Reconcile declared custom roles and the organization policy
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Path to the setup file
    #[arg(short = 'f', long = "file", default_value = "setup.yaml")]
    pub file: PathBuf,

    /// Path to the organization data template
    #[arg(long, default_value = "orgdata.yaml.hbs")]
    pub template: PathBuf,

    /// Preview changes without applying
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the apply command
pub async fn execute(args: ApplyArgs) -> CliResult<()> {
    let config = SetupConfig::load(&args.file)?;
    config.validate()?;
    let parent = config.parent();

    let data = template::load_org_data(&args.template, &config)?;
    data.validate(&parent)?;

    let credentials = Credentials::from_env()?;
    let client = IamClient::new(
        credentials,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    if args.dry_run {
        let report = reconcile::plan(&client, &parent, &data).await;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_planned_changes(&report, true);
        }
        if report.summary.failed > 0 {
            return Err(CliError::Validation(format!(
                "{} resource(s) could not be planned",
                report.summary.failed
            )));
        }
        return Ok(());
    }

    // Confirm before applying (unless --yes is passed)
    if !args.yes {
        let planned = reconcile::plan(&client, &parent, &data).await;

        if !planned.summary.has_changes() && planned.summary.failed == 0 {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&planned)?);
            } else {
                println!("No changes required. Organization is up to date.");
            }
            return Ok(());
        }

        if !args.json {
            print_planned_changes(&planned, false);
        }

        if !atty::is(atty::Stream::Stdin) {
            return Err(CliError::Validation(
                "Cannot confirm in non-interactive mode. Use --yes to skip confirmation."
                    .to_string(),
            ));
        }

        let changes_count = planned.summary.created + planned.summary.updated;
        let confirm = Confirm::new()
            .with_prompt(format!("Apply {changes_count} change(s)?"))
            .default(false)
            .interact()?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let report = reconcile::run(&client, &parent, &data).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_apply_results(&report);
    }

    if report.summary.failed > 0 {
        return Err(CliError::Validation(format!(
            "{} change(s) failed",
            report.summary.failed
        )));
    }

    Ok(())
}

/// Print planned changes in human-readable format
fn print_planned_changes(report: &ApplyReport, dry_run: bool) {
    if dry_run {
        println!("Dry run - no changes will be made.");
        println!();
        println!("Would apply:");
    } else {
        println!("Planning changes:");
    }

    for change in &report.changes {
        if change.action == ApplyAction::Unchanged {
            continue;
        }

        let color = change.action.color();
        let reset = "\x1b[0m";
        let symbol = change.action.symbol();

        print!("  {color}{symbol}{reset} ");
        print!(
            "{} {}: {}",
            change.action.display(),
            change.resource_type,
            change.name
        );

        if let Some(ref details) = change.details {
            print!(" ({details})");
        }

        if let Some(ref error) = change.error {
            print!(" - {error}");
        }

        println!();
    }

    println!();
    println!(
        "Summary: {} to create, {} to update, {} unchanged",
        report.summary.created, report.summary.updated, report.summary.unchanged
    );
    println!();
}

/// Print results after applying changes
fn print_apply_results(report: &ApplyReport) {
    for change in &report.changes {
        if change.action == ApplyAction::Unchanged {
            continue;
        }

        let (symbol, color) = if change.status.as_deref() == Some("success") {
            ("✓", "\x1b[32m")
        } else {
            ("✗", "\x1b[31m")
        };
        let reset = "\x1b[0m";

        print!(
            "  {}{}{} {} {}: {}",
            color,
            symbol,
            reset,
            if change.status.as_deref() == Some("success") {
                match change.action {
                    ApplyAction::Create => "Created",
                    ApplyAction::Update => "Updated",
                    _ => "Processed",
                }
            } else {
                "Failed"
            },
            change.resource_type,
            change.name
        );

        if let Some(ref details) = change.details {
            print!(" ({details})");
        }

        if let Some(ref error) = change.error {
            print!(" - {error}");
        }

        println!();
    }

    println!();

    if report.summary.failed > 0 {
        println!(
            "Applied {} change(s) with {} failure(s).",
            report.summary.created + report.summary.updated,
            report.summary.failed
        );
    } else {
        let total = report.summary.created + report.summary.updated;
        if total > 0 {
            println!("Applied {total} change(s) successfully.");
        } else {
            println!("No changes required. Organization is up to date.");
        }
    }
}
