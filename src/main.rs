//! depbot - GitLab dependency update bot
//!
//! Looks up the configured repository, reads its update policy document
//! and opens, refreshes or retires dependency update merge requests.

use clap::Parser;
use depbot::cli::CliArgs;
use depbot::context::RunContext;
use depbot::orchestrator::Orchestrator;
use depbot::resolver::CommandResolver;
use depbot::sourcecontrol::GitLabClient;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<()> {
    let context = RunContext::from_args(&args)?;
    let client = GitLabClient::new(&args.gitlab_hostname, &args.gitlab_token)?;
    let resolver = CommandResolver::new(&args.resolver, context.credentials.clone());

    let orchestrator = Orchestrator::new(context, client, resolver);
    orchestrator.run().await;
    Ok(())
}
