use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use stargazer_sdk::GithubClient;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stargazer::services::format_ranking;
use stargazer::{
    Admission, AppError, Config, JobHandle, JobUpdate, ProgressStats, RepoKey, SimilarRepoEntry,
    StargazerSystem,
};

/// Find repositories similar to a subject by the people who starred both.
#[derive(Debug, Parser)]
#[command(name = "stargazer", version)]
struct Cli {
    /// Repositories to analyse, one job each, in order
    #[arg(required = true, value_name = "OWNER/NAME")]
    repos: Vec<RepoKey>,

    /// Print each final ranking as JSON
    #[arg(long)]
    json: bool,

    /// Rows to print per ranking (overrides STARGAZER_TOP_RESULTS)
    #[arg(long)]
    top: Option<usize>,
}

/// JSON shape of one finished job
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobReport<'a> {
    repo: &'a RepoKey,
    stats: &'a ProgressStats,
    similar: &'a [SimilarRepoEntry],
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stargazer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = Config::from_env()?;
    if let Some(top) = cli.top {
        config.top_results = top;
    }

    let client = GithubClient::from_env()?;
    if !client.transport().is_authenticated() {
        info!("GITHUB_TOKEN not set, using the unauthenticated rate limit");
    }
    let system = StargazerSystem::start(&config, Arc::new(client));

    let mut outcome = Ok(());
    for repo in cli.repos {
        let result = match system.gatekeeper.submit(repo).await {
            Admission::Accepted(job) => follow(&job, &config, cli.json).await,
            Admission::Rejected { repo } => Err(AppError::Rejected(repo)),
        };
        if let Err(e) = result {
            error!("{e}");
            outcome = outcome.and(Err(e));
        }
    }
    outcome
}

/// Wait for the job's terminal update and print it.
async fn follow(job: &JobHandle, config: &Config, json: bool) -> Result<(), AppError> {
    let mut updates = job.subscribe();
    while let Some(update) = updates.recv().await {
        match update {
            JobUpdate::Progress(_) => continue,
            JobUpdate::Completed { stats, similar } => {
                let shown = &similar[..similar.len().min(config.top_results)];
                if json {
                    let report = JobReport {
                        repo: &job.repo,
                        stats: &stats,
                        similar: shown,
                    };
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!("Repositories similar to {}:", job.repo);
                    for line in format_ranking(shown, config.top_results) {
                        println!("{line}");
                    }
                }
                return Ok(());
            }
            JobUpdate::Failed { repo } => return Err(AppError::JobFailed(repo)),
        }
    }
    Err(AppError::Interrupted(job.repo.clone()))
}
