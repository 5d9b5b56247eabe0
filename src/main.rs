use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ci_status_sync::config::Config;
use ci_status_sync::github::{
    sign_app_jwt, AppIdentity, CheckStatus, Conclusion, EventType, GitHubClient, InstallationResolver,
    ReporterOptions, RepositorySpec, ReqwestTransport, ResolvedInstallation, RunEvent,
    StatusOpts, StatusReporter,
};

#[derive(Parser, Debug)]
#[command(name = "ci-status-sync")]
#[command(author, version, about = "Report pipeline run status to GitHub as a GitHub App", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "ci-status-sync.toml", env = "CI_STATUS_SYNC_CONFIG")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the App installation that can access a repository
    Resolve {
        /// Repository web URL, e.g. https://github.com/org/repo
        #[arg(long)]
        repo_url: String,
        /// GitHub Enterprise host
        #[arg(long)]
        enterprise_host: Option<String>,
    },
    /// Publish a pipeline run status on a commit
    Report {
        #[arg(long)]
        repo_url: String,
        #[arg(long)]
        enterprise_host: Option<String>,
        #[arg(long)]
        org: String,
        #[arg(long)]
        repo: String,
        #[arg(long)]
        sha: String,
        /// Pipeline run name (unique per run)
        #[arg(long)]
        run: String,
        /// Pipeline the run was created from
        #[arg(long, default_value = "")]
        original_run: String,
        /// queued, in_progress or completed
        #[arg(long)]
        status: CheckStatus,
        /// success, failure, skipped, neutral or pending
        #[arg(long)]
        conclusion: Option<Conclusion>,
        #[arg(long, default_value = "")]
        text: String,
        #[arg(long, default_value = "")]
        details_url: String,
        /// Pull request number, when the run was triggered by a pull request
        #[arg(long)]
        pull_request: Option<u64>,
        /// Use commit statuses instead of check runs
        #[arg(long)]
        commit_status: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting ci-status-sync v{}", env!("CARGO_PKG_VERSION"));

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let identity = config.github.app_identity()?;
    let transport = ReqwestTransport::new(config.http.timeout(), &config.http.user_agent)?;
    let client = Arc::new(
        GitHubClient::new(&config.github.api_url, Arc::new(transport))
            .with_app_identity(identity.clone())
            .with_cancellation(cancel),
    );

    match cli.command {
        Command::Resolve {
            repo_url,
            enterprise_host,
        } => {
            let host = enterprise_host.or_else(|| config.github.enterprise_host.clone());
            let resolved = resolve(&config, &identity, &client, &repo_url, host.as_deref()).await?;
            println!("{}", resolved.installation_id);
        }
        Command::Report {
            repo_url,
            enterprise_host,
            org,
            repo,
            sha,
            run,
            original_run,
            status,
            conclusion,
            text,
            details_url,
            pull_request,
            commit_status,
        } => {
            let host = enterprise_host.or_else(|| config.github.enterprise_host.clone());
            let resolved = resolve(&config, &identity, &client, &repo_url, host.as_deref()).await?;
            if !resolved.is_match() {
                anyhow::bail!("GitHub App is not installed for {}", repo_url);
            }

            let event = RunEvent {
                organization: org,
                repository: repo,
                sha,
                event_type: if pull_request.is_some() {
                    EventType::PullRequest
                } else {
                    EventType::Push
                },
                pull_request_number: pull_request,
                info_from_repo: commit_status,
            };
            let options = ReporterOptions {
                application_name: config.github.application_name.clone(),
                log_url: config.github.log_url.clone(),
            };
            let mut status_opts = StatusOpts::new(run, status);
            status_opts.original_pipeline_run_name = original_run;
            status_opts.conclusion = conclusion;
            status_opts.text = text;
            status_opts.details_url = details_url;

            let reporter = StatusReporter::new(client.clone());
            reporter
                .report(&event, &options, status_opts)
                .await
                .context("Failed to report pipeline status")?;
            tracing::info!("Status reported");
        }
    }

    Ok(())
}

async fn resolve(
    config: &Config,
    identity: &AppIdentity,
    client: &GitHubClient,
    repo_url: &str,
    enterprise_host: Option<&str>,
) -> Result<ResolvedInstallation> {
    let jwt = sign_app_jwt(identity, Utc::now())?;

    let resolver = InstallationResolver::new(client, &config.github.namespace);
    let resolved = resolver
        .resolve(&jwt, &RepositorySpec::new(repo_url), enterprise_host)
        .await
        .context("Failed to resolve GitHub App installation")?;

    Ok(resolved)
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("Interrupt received, cancelling in-flight requests");
        cancel.cancel();
    }
}
