//! pr-policy - resolve branch policies and match pull request rules

mod cli;

use anstream::eprintln;
use clap::{Parser, Subcommand};
use cli::CommandContext;
use cli::check::{PullRequestInput, run_check};
use cli::resolve::run_resolve;
use cli::show::run_show;
use owo_colors::OwoColorize;
use pr_policy::types::Repository;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pr-policy")]
#[command(about = "Resolve branch policies and match pull request rules")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitHub Enterprise host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the effective policy for a branch from a local policy file
    Resolve {
        /// Policy file
        file: PathBuf,

        /// Target branch name
        #[arg(short, long)]
        branch: String,
    },

    /// Match pull request rules against a pull request
    Check {
        /// Policy file containing pull_request_rules
        file: PathBuf,

        /// Pull request attribute snapshot (JSON or YAML)
        #[arg(long, conflicts_with_all = ["repo", "number"])]
        pr: Option<PathBuf>,

        /// Repository (owner/repo or URL) to fetch the pull request from
        #[arg(long, requires = "number")]
        repo: Option<String>,

        /// Pull request number
        #[arg(long, requires = "repo")]
        number: Option<u64>,
    },

    /// Fetch and validate a repository's policy from GitHub
    Show {
        /// Repository (owner/repo or URL)
        #[arg(long)]
        repo: String,

        /// Git ref to read the policy from (default branch if omitted)
        #[arg(long = "ref")]
        git_ref: Option<String>,

        /// Also resolve the effective policy for this branch
        #[arg(short, long)]
        branch: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pr_policy=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = CommandContext::new(cli.config.as_deref(), cli.host.as_deref())?;

    match cli.command {
        Commands::Resolve { file, branch } => run_resolve(&ctx, &file, &branch),
        Commands::Check {
            file,
            pr,
            repo,
            number,
        } => {
            let input = match (pr, repo, number) {
                (Some(path), _, _) => PullRequestInput::File(path),
                (None, Some(repo), Some(number)) => PullRequestInput::Remote {
                    repository: Repository::parse(&repo)?,
                    number,
                },
                _ => anyhow::bail!("either --pr or --repo with --number is required"),
            };
            run_check(&ctx, &file, input).await
        }
        Commands::Show {
            repo,
            git_ref,
            branch,
        } => {
            run_show(
                &ctx,
                &Repository::parse(&repo)?,
                git_ref.as_deref(),
                branch.as_deref(),
            )
            .await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
