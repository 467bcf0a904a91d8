/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for AEM-Purge. Lists stored content packages,
    keeps the newest version of each package family and
    deletes outdated versions after operator confirmation.

  Security / Safety Notes:
    Sends basic-auth credentials to the configured host only.
    Nothing is deleted without an explicit `y`.

  Dependencies:
    clap for CLI parsing, tokio for the async runtime.

  Operational Scope:
    Invoked by administrators reclaiming package storage on
    an author or publish instance.

  Revision History:
    2025-11-12 COD  Authored AEM-Purge runtime.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

mod config;
mod error;
mod logger;
mod packmgr;
mod plan;
mod prompt;
mod record;
mod selector;
mod size;
mod snapshot;
mod version;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{ArgAction, Parser};

use config::{today, validate, CliOverrides, FileConfig, PurgeConfig};
use error::{PurgeError, Result};
use logger::{session_log_path, Logger};
use packmgr::PackageManagerClient;
use plan::{
    purge_packages, write_ledgers, PackageRemover, PackageSource, PurgeOptions, PurgePlan,
    PurgeReport,
};
use prompt::{ask, Confirmation};

/// Command-line arguments for AEM-Purge.
#[derive(Debug, Parser)]
#[command(
    name = "aem-purge",
    version,
    author = "Synavera Systems",
    about = "Remove outdated content packages, keeping the newest version of each"
)]
struct Cli {
    /// Only consider packages created on or before this date (YYYY-MM-DD).
    #[arg(value_name = "DATE")]
    date: Option<String>,
    /// Package sub-path, e.g. "adobe" searches under /etc/packages/adobe.
    #[arg(short, long, value_name = "PATH")]
    path: Option<String>,
    /// Host of the instance as host:port.
    #[arg(long, value_name = "HOST")]
    host: Option<String>,
    /// Credentials as user:pass.
    #[arg(short, long, value_name = "USER:PASS")]
    user: Option<String>,
    /// Do not ask for confirmation before each package delete.
    #[arg(short, long, action = ArgAction::SetTrue)]
    force: bool,
    /// Log more output.
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
    /// Report what would be purged without deleting anything.
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// HTTP timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            date: self.date.clone(),
            path: self.path.clone(),
            host: self.host.clone(),
            user: self.user.clone(),
            timeout_secs: self.timeout,
            force: self.force,
            verbose: self.verbose,
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[AEM-Purge] {err}");
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let file = FileConfig::load_from_optional_path(cli.config.as_deref())?;
    let config = PurgeConfig::resolve(file, cli.overrides());

    let violations = validate(&config);
    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("{violation}");
        }
        return Err(PurgeError::Config(format!(
            "{} invalid argument(s)",
            violations.len()
        )));
    }

    if config.verbose {
        for (name, value) in config.effective_values() {
            println!("{name} = {value}");
        }
    }

    let log_path = cli
        .log
        .clone()
        .unwrap_or_else(|| session_log_path(&config.log_dir, Utc::now()));
    let logger = Logger::new(Some(log_path), config.verbose)?;
    logger.info("INIT", format!("Purge run against {}", config.host));

    let client = PackageManagerClient::new(&config)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let outcome = purge(&config, &client, &mut input, &mut output, &logger).await;
    if let Ok(RunOutcome::Purged(report)) = &outcome {
        logger.info("COMPLETE", report.summary_line());
    }
    seal(outcome, &logger).map(|_| ExitCode::SUCCESS)
}

/// How a run that did not fail came to an end.
#[derive(Debug, PartialEq, Eq)]
enum RunOutcome {
    NothingToPurge,
    DryRun,
    Declined,
    Purged(PurgeReport),
}

/// Log a fatal outcome and seal the session log. A failure to seal is
/// reported but never replaces the run's own result.
fn seal<T>(outcome: Result<T>, logger: &Logger) -> Result<T> {
    if let Err(err) = &outcome {
        logger.error("FATAL", err.to_string());
    }
    if let Err(err) = logger.finalize() {
        eprintln!("[AEM-Purge] {err}");
    }
    outcome
}

async fn purge<C, R, W>(
    config: &PurgeConfig,
    remote: &C,
    input: &mut R,
    output: &mut W,
    logger: &Logger,
) -> Result<RunOutcome>
where
    C: PackageSource + PackageRemover,
    R: BufRead,
    W: Write,
{
    let listing = remote.fetch(&config.path, &config.date).await?;
    writeln!(output, "{} packages found", listing.total)?;
    logger.info(
        "PACKAGES",
        format!(
            "scope={:?} upper_bound={} hits={}",
            config.path,
            config.date,
            listing.packages.len()
        ),
    );

    let plan = PurgePlan::build(&listing.packages, logger);
    if plan.is_empty() {
        writeln!(output, "No outdated packages found")?;
        logger.info("COMPLETE", "Nothing to purge.");
        return Ok(RunOutcome::NothingToPurge);
    }
    writeln!(
        output,
        "{} outdated packages found ({} snapshots)",
        plan.outdated.len(),
        plan.outdated_snapshots.len()
    )?;

    let repository = remote.fetch("", &today()).await?;
    let plan = plan.with_repository(&repository.packages);
    writeln!(output, "{}", plan.size_line())?;

    let ledgers = write_ledgers(&plan, &config.work_dir)?;
    logger.info(
        "LEDGER",
        format!(
            "retain={} remove={}",
            ledgers.retain.display(),
            ledgers.remove.display()
        ),
    );

    if config.dry_run {
        writeln!(output, "Dry run; nothing deleted")?;
        return Ok(RunOutcome::DryRun);
    }

    match ask(input, output, "Do you wish to continue?")? {
        Confirmation::Yes => {}
        Confirmation::No => {
            writeln!(output, "Aborting operation")?;
            logger.info("ABORT", "Operator declined purge.");
            return Ok(RunOutcome::Declined);
        }
        Confirmation::Unrecognized => {
            writeln!(output, "Input not recognized. Aborting operation")?;
            return Err(PurgeError::Aborted("confirmation not recognized".into()));
        }
    }

    writeln!(output, "Purging packages...")?;
    let options = PurgeOptions {
        force: config.force,
        verbose: config.verbose,
    };
    let report = purge_packages(&plan, remote, &options, input, output, logger).await?;
    writeln!(output, "{}", report.summary_line())?;
    logger.info(
        "SUMMARY",
        format!(
            "deleted={} failed={} skipped={}",
            report.deleted, report.failed, report.skipped
        ),
    );

    report.into_result().map(RunOutcome::Purged)
}
