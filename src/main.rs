//! sqldeploy - apply ordered SQL scripts to a managed database over HTTP.

mod cli;
mod logging;

use std::path::{Path, PathBuf};

use cli::{files_or_configured, Cli, Command, DeployArgs};
use sqldeploy::config::Config;
use sqldeploy::error::{DeployError, Result};
use sqldeploy::executor::{verify_tables, BatchExecutor, CandidateList, HttpTransport};
use sqldeploy::script::SplitMode;
use sqldeploy::validator::{ValidationSummary, Validator};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Runs the selected subcommand and returns the process exit status.
async fn run(cli: Cli) -> Result<i32> {
    load_env_file(cli.env_file.as_deref());

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.remote.apply_env_defaults();

    match cli.command {
        Command::Validate { files } => validate(&files, &config),
        Command::Deploy(args) => deploy(args, config).await,
        Command::Ping { url } => ping(url, config).await,
        Command::Verify { tables, url } => verify(tables, url, config).await,
    }
}

/// Loads credentials from an env file. A missing default `.env` is fine.
fn load_env_file(path: Option<&Path>) {
    match path {
        Some(path) => {
            if let Err(e) = dotenvy::from_path(path) {
                warn!("Could not load {}: {}", path.display(), e);
            }
        }
        None => {
            if let Err(e) = dotenvy::dotenv() {
                if !e.not_found() {
                    warn!("Could not load .env: {}", e);
                }
            }
        }
    }
}

fn validate(files: &[PathBuf], config: &Config) -> Result<i32> {
    let validator = Validator::from_config(&config.validator)?;
    let summary = validator.validate_all(&files_or_configured(files, config));
    print_validation(&summary);
    Ok(summary.exit_code())
}

async fn deploy(args: DeployArgs, mut config: Config) -> Result<i32> {
    if let Some(url) = args.url {
        config.remote.url = Some(url);
    }
    if let Some(delay_ms) = args.delay_ms {
        config.remote.statement_delay_ms = delay_ms;
    }
    if args.strip_leading_comments {
        config.split.strip_leading_comments = true;
    }
    let files = files_or_configured(&args.files, &config);

    if args.validate {
        let validator = Validator::from_config(&config.validator)?;
        let summary = validator.validate_all(&files);
        print_validation(&summary);
        if !summary.all_valid() {
            warn!("Validation failed; nothing was deployed");
            return Ok(1);
        }
    }

    let candidates = CandidateList::from_config(&config.remote)?;
    let transport = HttpTransport::from_config(&config.remote)?;
    info!("Target: {}", config.remote.display_string());

    let executor = BatchExecutor::new(&transport, candidates)
        .with_delay(config.remote.statement_delay())
        .with_split_mode(SplitMode::from(&config.split));
    let summary = executor.deploy_all(&files).await;

    println!("{summary}");
    if summary.files_with_progress() == 0 {
        println!("API deployment was not successful. Apply the files manually, in order:");
        for file in &files {
            println!("  {}", file.display());
        }
    }

    if args.verify {
        let base = config.remote.base_url()?;
        let report = verify_tables(&transport, &base, &config.remote.verify_tables).await;
        println!("{report}");
    }

    // Deployment progress does not gate the exit status.
    Ok(0)
}

async fn ping(url: Option<String>, mut config: Config) -> Result<i32> {
    if let Some(url) = url {
        config.remote.url = Some(url);
    }
    let base = config.remote.base_url()?;
    let transport = HttpTransport::from_config(&config.remote)?;

    match transport.ping(&base).await {
        Ok(status) if status.is_success() => {
            println!("REST API connection: SUCCESS ({status})");
            Ok(0)
        }
        Ok(status) => {
            println!("REST API connection: FAILED (status: {status})");
            Ok(1)
        }
        Err(e) => {
            println!("Connection test failed: {e}");
            Ok(1)
        }
    }
}

async fn verify(tables: Vec<String>, url: Option<String>, mut config: Config) -> Result<i32> {
    if let Some(url) = url {
        config.remote.url = Some(url);
    }
    if !tables.is_empty() {
        config.remote.verify_tables = tables;
    }
    if config.remote.verify_tables.is_empty() {
        return Err(DeployError::config(
            "No tables to verify. Pass table names or set [remote].verify_tables",
        ));
    }

    let base = config.remote.base_url()?;
    let transport = HttpTransport::from_config(&config.remote)?;
    info!("Target: {}", config.remote.display_string());

    let report = verify_tables(&transport, &base, &config.remote.verify_tables).await;
    println!("{report}");
    Ok(if report.all_present() { 0 } else { 1 })
}

fn print_validation(summary: &ValidationSummary) {
    for report in &summary.reports {
        println!("{report}");
    }
    for (path, reason) in &summary.unreadable {
        println!("Could not read {}: {}\n", path.display(), reason);
    }

    if summary.all_valid() {
        println!("SUCCESS: All SQL files validated successfully!");
    } else {
        println!(
            "ERROR: Validation failed for some files ({}/{} valid).",
            summary.valid_files(),
            summary.total_files()
        );
    }
}
