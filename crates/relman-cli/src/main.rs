//! relman - multi-repository release manager
//!
//! ## Commands
//!
//! - `initialize-release`: open the labeled production pull request in every
//!   managed-release repository
//! - `prepare-release`: validate release pull requests (optionally merging
//!   them) and production pipelines
//! - `deploy-release`: promote the deployment repository through UAT/OA-QA or
//!   production

mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, Level};

use relman_aws::{CodeCommitPromotionHost, CodePipelineProvider, StsIdentityBroker};
use relman_core::obs::{emit_release_finished, emit_release_started, RunSpan};
use relman_core::telemetry::init_tracing;
use relman_core::{
    assume_role, resolve_config, DeployTarget, MfaCode, PrepareRelease, ReleaseConfig,
    ReleaseDeployer, ReleaseId, ReleaseInitializer, ReleaseReport, RepositoryQuery,
    RepositorySelector, Role,
};
use relman_github::{GitHubClient, GitHubClientConfig};

#[derive(Parser)]
#[command(name = "relman")]
#[command(author = "Moxion Engineering")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-repository release manager", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Path to relman.toml (default: $RELMAN_CONFIG, then ./relman.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format for the final report
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the production pull request for a release in every repository
    InitializeRelease {
        /// Release id (ticket id), used as the pull request label
        #[arg(long)]
        id: String,

        /// Only these repositories (name or clone URL)
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        repos: Vec<String>,

        /// Head branch for the pull requests, e.g. a hotfix branch
        #[arg(long)]
        base: Option<String>,
    },

    /// Validate release pull requests and production pipelines
    PrepareRelease {
        /// Release id (ticket id)
        #[arg(long)]
        id: String,

        /// AWS MFA token code (prompted for when omitted)
        #[arg(long)]
        mfa: Option<String>,

        /// Merge open, mergeable release pull requests
        #[arg(long)]
        force: bool,
    },

    /// Promote the release through UAT/OA-QA or to production
    DeployRelease {
        /// Release id (ticket id)
        #[arg(long)]
        id: String,

        /// AWS MFA token code (prompted for when omitted)
        #[arg(long)]
        mfa: Option<String>,

        #[command(flatten)]
        target: TargetArgs,

        /// Fast-forward merge each promotion pull request
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone, Copy)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Deploy to UAT and OA-QA
    #[arg(long)]
    uat: bool,

    /// Deploy to production
    #[arg(long)]
    production: bool,
}

impl TargetArgs {
    fn target(self) -> DeployTarget {
        if self.production {
            DeployTarget::Production
        } else {
            DeployTarget::Uat
        }
    }
}

/// Final command output for `--format json`.
#[derive(Serialize)]
struct CommandOutput<'a> {
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    conclusion: Option<&'a str>,
    report: &'a ReleaseReport,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_codes::FAULT)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config =
        resolve_config(cli.config.as_deref()).context("Failed to load relman configuration")?;

    match cli.command {
        Commands::InitializeRelease { id, repos, base } => {
            cmd_initialize(&config, cli.format, &id, repos, base).await
        }
        Commands::PrepareRelease { id, mfa, force } => {
            cmd_prepare(&config, cli.format, &id, mfa, force).await
        }
        Commands::DeployRelease {
            id,
            mfa,
            target,
            force,
        } => cmd_deploy(&config, cli.format, &id, mfa, target.target(), force).await,
    }
}

fn github_client(config: &ReleaseConfig) -> Result<GitHubClient> {
    let client_config =
        GitHubClientConfig::from_env(&config.github.api_url, config.github.page_size)
            .context("Failed to configure GitHub access")?;
    GitHubClient::new(client_config).context("Failed to create GitHub client")
}

fn selector(config: &ReleaseConfig) -> RepositorySelector {
    RepositorySelector::new(RepositoryQuery {
        org: config.github.org.clone(),
        topic: config.github.topic.clone(),
        visibility: config.github.visibility,
    })
}

/// Use `--mfa` when given, otherwise prompt on the terminal without echo.
fn mfa_code(flag: Option<String>) -> Result<MfaCode> {
    let raw = match flag {
        Some(code) => code,
        None => rpassword::prompt_password("AWS MFA Token Code: ")
            .context("Failed to read MFA code")?,
    };
    Ok(MfaCode::new(raw)?)
}

fn emit_output(
    report: &ReleaseReport,
    format: OutputFormat,
    ready: bool,
    conclusion: Option<&str>,
) -> Result<u8> {
    match format {
        OutputFormat::Text => {
            print!("{}", report.render_text());
            if let Some(conclusion) = conclusion {
                println!("{conclusion}");
            }
        }
        OutputFormat::Json => {
            let output = CommandOutput {
                ready,
                conclusion,
                report,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    emit_release_finished(
        &report.command,
        &report.release_id,
        ready,
        report.failures().count(),
    );
    Ok(if ready {
        exit_codes::OK
    } else {
        exit_codes::NOT_READY
    })
}

/// Open the labeled production pull request in every selected repository
async fn cmd_initialize(
    config: &ReleaseConfig,
    format: OutputFormat,
    id: &str,
    repos: Vec<String>,
    base: Option<String>,
) -> Result<u8> {
    const COMMAND: &str = "initialize-release";
    let release_id = ReleaseId::new(id)?;
    let _span = RunSpan::enter(COMMAND, release_id.as_str());
    emit_release_started(COMMAND, release_id.as_str());

    let host = github_client(config)?;
    let mut report = ReleaseReport::new(release_id.as_str(), COMMAND);
    let selected = selector(config)
        .with_allow_list(repos)
        .select(&host, &mut report)
        .await
        .context("Failed to search repositories")?;

    let base = base.unwrap_or_else(|| config.branches.base.clone());
    ReleaseInitializer::new(release_id, base, &config.branches.production)
        .run(&host, &selected, &mut report)
        .await
        .context("Failed to initialize release")?;

    let ready = report.passed();
    emit_output(&report, format, ready, None)
}

/// Validate pull requests, then pipelines
async fn cmd_prepare(
    config: &ReleaseConfig,
    format: OutputFormat,
    id: &str,
    mfa: Option<String>,
    force: bool,
) -> Result<u8> {
    const COMMAND: &str = "prepare-release";
    let release_id = ReleaseId::new(id)?;
    let code = mfa_code(mfa)?;
    let _span = RunSpan::enter(COMMAND, release_id.as_str());
    emit_release_started(COMMAND, release_id.as_str());

    let broker = StsIdentityBroker::new(&config.aws.identity_profile, &config.aws.region);
    let artifacts = assume_role(&broker, &config.aws, Role::Artifacts, &code)
        .await
        .context("Failed to assume the artifacts role")?;

    let host = github_client(config)?;
    let pipelines = CodePipelineProvider::new(&config.aws.region);
    let mut report = ReleaseReport::new(release_id.as_str(), COMMAND);
    let selected = selector(config)
        .select(&host, &mut report)
        .await
        .context("Failed to search repositories")?;

    let verdict = PrepareRelease::new(config, release_id, force)
        .run(&host, &pipelines, &artifacts, &selected, &mut report)
        .await
        .context("Failed to prepare release")?;
    info!("{}", verdict.conclusion());

    emit_output(&report, format, verdict.ready(), Some(verdict.conclusion()))
}

/// Promote the deployment repository
async fn cmd_deploy(
    config: &ReleaseConfig,
    format: OutputFormat,
    id: &str,
    mfa: Option<String>,
    target: DeployTarget,
    force: bool,
) -> Result<u8> {
    const COMMAND: &str = "deploy-release";
    let release_id = ReleaseId::new(id)?;
    let code = mfa_code(mfa)?;
    let _span = RunSpan::enter(COMMAND, release_id.as_str());
    emit_release_started(COMMAND, release_id.as_str());

    let broker = StsIdentityBroker::new(&config.aws.identity_profile, &config.aws.region);
    let shared = assume_role(&broker, &config.aws, Role::Shared, &code)
        .await
        .context("Failed to assume the shared role")?;

    let host = CodeCommitPromotionHost::new(&config.aws.region);
    let mut report = ReleaseReport::new(release_id.as_str(), COMMAND);
    ReleaseDeployer::new(&config.deploy.repository, release_id, force)
        .deploy(&host, &shared, target, &mut report)
        .await
        .with_context(|| format!("Failed to deploy release to {}", target.label()))?;

    let ready = report.passed();
    emit_output(&report, format, ready, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_initialize_parses_repos_and_base() {
        let cli = Cli::try_parse_from([
            "relman",
            "initialize-release",
            "--id",
            "REL-42",
            "--repos",
            "app-a,app-b",
            "--base",
            "hotfix",
        ])
        .unwrap();
        match cli.command {
            Commands::InitializeRelease { id, repos, base } => {
                assert_eq!(id, "REL-42");
                assert_eq!(repos, vec!["app-a", "app-b"]);
                assert_eq!(base.as_deref(), Some("hotfix"));
            }
            _ => panic!("expected initialize-release"),
        }
    }

    #[test]
    fn test_deploy_requires_exactly_one_target() {
        assert!(Cli::try_parse_from(["relman", "deploy-release", "--id", "REL-1", "--mfa", "1"])
            .is_err());
        assert!(Cli::try_parse_from([
            "relman",
            "deploy-release",
            "--id",
            "REL-1",
            "--uat",
            "--production"
        ])
        .is_err());

        let cli = Cli::try_parse_from(["relman", "deploy-release", "--id", "REL-1", "--production"])
            .unwrap();
        match cli.command {
            Commands::DeployRelease { target, force, .. } => {
                assert_eq!(target.target(), DeployTarget::Production);
                assert!(!force);
            }
            _ => panic!("expected deploy-release"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "relman",
            "prepare-release",
            "--id",
            "REL-1",
            "--force",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
    }

    #[test]
    fn test_mfa_flag_is_validated() {
        assert!(mfa_code(Some("123456".to_string())).is_ok());
        assert!(mfa_code(Some("12ab".to_string())).is_err());
    }

    #[test]
    fn test_json_output_exit_code() {
        let mut report = ReleaseReport::new("REL-1", "prepare-release");
        report.record(
            relman_core::Phase::PullRequests,
            "app-a#1",
            relman_core::Outcome::Fail,
            "draft",
            "draft",
        );
        let code = emit_output(&report, OutputFormat::Json, false, Some("not ready")).unwrap();
        assert_eq!(code, exit_codes::NOT_READY);
    }
}
