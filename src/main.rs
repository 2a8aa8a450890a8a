//! orgadm CLI - organization IAM bootstrap and reconciliation
//!
//! This CLI enables platform administrators to:
//! - Declare custom organization roles and their permissions
//! - Declare the organization-wide IAM policy bindings
//! - Reconcile live state against the declaration, applying only the
//!   minimal changes needed

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use orgadm::commands;
use orgadm::error::CliResult;

/// orgadm - Google Cloud organization IAM management
#[derive(Parser)]
#[command(name = "orgadm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile declared roles and the organization policy
    Apply(commands::apply::ApplyArgs),

    /// Check the setup file and template without contacting the API
    Validate(commands::validate::ValidateArgs),
}

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Apply(args) => commands::apply::execute(args).await,
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
