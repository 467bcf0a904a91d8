/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::plan
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Compose the decision engine into a purge plan, report its
    impact, persist retain/remove ledgers and drive deletion
    of the outdated packages.

  Security / Safety Notes:
    Only non-snapshot outdated packages are submitted for
    deletion; snapshots go with their package.

  Dependencies:
    serde for the plan document, chrono for timestamps.

  Operational Scope:
    Called from `main` after the initial fetch.

  Revision History:
    2025-11-12 COD  Authored purge planner.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Planning is pure; execution is sequential
    - Per-item failures never abort the batch
    - Deterministic ordering for reproducible ledgers
============================================================*/

use std::fs::{self, File};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{PurgeError, Result};
use crate::logger::Logger;
use crate::packmgr::{DeleteOutcome, PackageListing, PackageManagerClient};
use crate::prompt::{ask, Confirmation};
use crate::record::PackageRecord;
use crate::selector::{derive_outdated, select_best};
use crate::size::{calculate_size, display_precision, format_gb};
use crate::snapshot::find_outdated_snapshots;

pub const RETAIN_LEDGER: &str = "retain.txt";
pub const REMOVE_LEDGER: &str = "remove.txt";
pub const PLAN_DOCUMENT: &str = "plan.json";

/// Keep/purge partition of one package listing.
#[derive(Debug, Clone, Serialize)]
pub struct PurgePlan {
    pub generated_at: String,
    pub scanned: usize,
    pub conventional: usize,
    pub retained: Vec<PackageRecord>,
    pub outdated: Vec<PackageRecord>,
    pub outdated_snapshots: Vec<PackageRecord>,
    /// GB freed by deleting `outdated` (snapshots included).
    pub size_to_remove: f64,
    /// GB stored in the whole repository.
    pub total_size: f64,
}

impl PurgePlan {
    /// Partition `packages` into retained, outdated and outdated snapshots.
    pub fn build(packages: &[PackageRecord], logger: &Logger) -> Self {
        let conventional: Vec<PackageRecord> = packages
            .iter()
            .filter(|package| package.is_conventional())
            .cloned()
            .collect();
        let retained = select_best(&conventional);
        let outdated = derive_outdated(&conventional, &retained);
        let outdated_snapshots = find_outdated_snapshots(packages, &outdated);

        for package in &outdated {
            logger.debug("OUTDATED", &package.path);
        }
        for package in &outdated_snapshots {
            logger.debug("SNAPSHOT", &package.path);
        }

        let size_to_remove = calculate_size(outdated.iter().chain(outdated_snapshots.iter()));

        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            scanned: packages.len(),
            conventional: conventional.len(),
            retained,
            outdated,
            outdated_snapshots,
            size_to_remove,
            total_size: 0.0,
        }
    }

    /// Record the size of the full repository listing.
    pub fn with_repository(mut self, repository: &[PackageRecord]) -> Self {
        self.total_size = calculate_size(repository);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.outdated.is_empty()
    }

    /// Outdated packages followed by their snapshots.
    pub fn removals(&self) -> impl Iterator<Item = &PackageRecord> {
        self.outdated.iter().chain(self.outdated_snapshots.iter())
    }

    /// `Purging outdated packages will remove X GB / Y GB of package data`
    pub fn size_line(&self) -> String {
        let places = display_precision(self.size_to_remove);
        format!(
            "Purging outdated packages will remove {} GB / {} GB of package data",
            format_gb(self.size_to_remove, places),
            format_gb(self.total_size, places)
        )
    }
}

/// Files written by [`write_ledgers`].
#[derive(Debug, Clone)]
pub struct LedgerPaths {
    pub retain: PathBuf,
    pub remove: PathBuf,
    pub plan: PathBuf,
}

/// Persist retained and removed paths, one per line, plus the plan as JSON.
pub fn write_ledgers(plan: &PurgePlan, dir: &Path) -> Result<LedgerPaths> {
    fs::create_dir_all(dir).map_err(|err| {
        PurgeError::Filesystem(format!(
            "Failed to create work directory {}: {err}",
            dir.display()
        ))
    })?;

    let paths = LedgerPaths {
        retain: dir.join(RETAIN_LEDGER),
        remove: dir.join(REMOVE_LEDGER),
        plan: dir.join(PLAN_DOCUMENT),
    };
    write_list(&paths.retain, plan.retained.iter())?;
    write_list(&paths.remove, plan.removals())?;

    let file = File::create(&paths.plan).map_err(|err| {
        PurgeError::Filesystem(format!(
            "Failed to create plan file {}: {err}",
            paths.plan.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, plan).map_err(|err| {
        PurgeError::Filesystem(format!(
            "Failed to write plan {}: {err}",
            paths.plan.display()
        ))
    })?;
    Ok(paths)
}

fn write_list<'a, I>(path: &Path, packages: I) -> Result<()>
where
    I: Iterator<Item = &'a PackageRecord>,
{
    let mut body = String::new();
    for package in packages {
        body.push_str(&package.path);
        body.push('\n');
    }
    fs::write(path, body).map_err(|err| {
        PurgeError::Filesystem(format!("Failed to write {}: {err}", path.display()))
    })
}

/// Remote listing capability used to build a plan.
#[allow(async_fn_in_trait)]
pub trait PackageSource {
    async fn fetch(&self, scope: &str, upper_bound: &str) -> Result<PackageListing>;
}

impl PackageSource for PackageManagerClient {
    async fn fetch(&self, scope: &str, upper_bound: &str) -> Result<PackageListing> {
        self.fetch_packages(scope, upper_bound).await
    }
}

/// Remote deletion capability used by [`purge_packages`].
#[allow(async_fn_in_trait)]
pub trait PackageRemover {
    async fn remove(&self, path: &str) -> Result<DeleteOutcome>;
}

impl PackageRemover for PackageManagerClient {
    async fn remove(&self, path: &str) -> Result<DeleteOutcome> {
        self.delete_package(path).await
    }
}

/// Per-run deletion tally.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    pub deleted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl PurgeReport {
    pub fn attempted(&self) -> usize {
        self.deleted + self.failed
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Deleted {} package(s), {} failed, {} skipped",
            self.deleted, self.failed, self.skipped
        )
    }

    /// `PartialPurge` when any deletion failed.
    pub fn into_result(self) -> Result<Self> {
        if self.failed > 0 {
            return Err(PurgeError::PartialPurge {
                failed: self.failed,
                attempted: self.attempted(),
            });
        }
        Ok(self)
    }
}

/// Operator interaction and verbosity for [`purge_packages`].
pub struct PurgeOptions {
    /// Skip the per-package confirmation.
    pub force: bool,
    pub verbose: bool,
}

/// Delete every outdated package in order, one request at a time.
///
/// Without `force` each deletion is confirmed first; `n` skips the package
/// and an unrecognized answer aborts the remaining batch after reporting
/// what was already done.
pub async fn purge_packages<D, R, W>(
    plan: &PurgePlan,
    remover: &D,
    options: &PurgeOptions,
    input: &mut R,
    output: &mut W,
    logger: &Logger,
) -> Result<PurgeReport>
where
    D: PackageRemover,
    R: BufRead,
    W: Write,
{
    let mut report = PurgeReport::default();

    for package in &plan.outdated {
        let path = package.path.as_str();
        if !options.force {
            match ask(input, output, &format!("Delete {path}?"))? {
                Confirmation::Yes => {}
                Confirmation::No => {
                    writeln!(output, "Skipping {path}")?;
                    logger.info("SKIP", path);
                    report.skipped += 1;
                    continue;
                }
                Confirmation::Unrecognized => {
                    writeln!(output, "Input not recognized. Aborting operation")?;
                    writeln!(output, "{}", report.summary_line())?;
                    return Err(PurgeError::Aborted(format!(
                        "unrecognized answer while confirming {path}"
                    )));
                }
            }
        }

        writeln!(output, "Deleting {path}")?;
        match remover.remove(path).await {
            Ok(outcome) => {
                if outcome.success {
                    writeln!(output, "Done")?;
                    logger.info("DELETE", path);
                    report.deleted += 1;
                } else {
                    writeln!(output, "Failed")?;
                    logger.warn(
                        "DELETE",
                        format!(
                            "{path} rejected: {}",
                            outcome.message.as_deref().unwrap_or("no message")
                        ),
                    );
                    report.failed += 1;
                }
                if options.verbose {
                    if let Some(message) = outcome.message.as_deref() {
                        writeln!(output, "{message}")?;
                    }
                }
            }
            Err(err) => {
                writeln!(output, "Failed: {err}")?;
                logger.warn("DELETE", format!("{path}: {err}"));
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn quiet() -> Logger {
        Logger::new(None, false).expect("logger")
    }

    fn mb(paths: &[&str]) -> Vec<PackageRecord> {
        paths.iter().map(|path| PackageRecord::new(*path, "1 MB")).collect()
    }

    fn paths(records: &[PackageRecord]) -> Vec<&str> {
        records.iter().map(|record| record.path.as_str()).collect()
    }

    struct ScriptedRemover {
        calls: RefCell<Vec<String>>,
        failing: Vec<&'static str>,
        rejected: Vec<&'static str>,
    }

    impl ScriptedRemover {
        fn new(failing: Vec<&'static str>, rejected: Vec<&'static str>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                failing,
                rejected,
            }
        }
    }

    impl PackageRemover for ScriptedRemover {
        async fn remove(&self, path: &str) -> Result<DeleteOutcome> {
            self.calls.borrow_mut().push(path.to_string());
            if self.failing.iter().any(|failing| *failing == path) {
                return Err(PurgeError::Network(format!(
                    "Delete of {path} failed with status 500 Internal Server Error"
                )));
            }
            Ok(DeleteOutcome {
                success: !self.rejected.iter().any(|rejected| *rejected == path),
                message: Some("Package deleted".into()),
            })
        }
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime")
            .block_on(future)
    }

    #[test]
    fn plans_outdated_and_their_snapshots() {
        let packages = mb(&[
            "pkg-1.0.zip",
            "pkg-2.0.zip",
            "pkg-1.0/.snapshot/pkg-1.0.zip",
        ]);
        let plan = PurgePlan::build(&packages, &quiet()).with_repository(&packages);
        assert_eq!(paths(&plan.outdated), vec!["pkg-1.0.zip"]);
        assert_eq!(
            paths(&plan.outdated_snapshots),
            vec!["pkg-1.0/.snapshot/pkg-1.0.zip"]
        );
        assert_eq!(paths(&plan.retained), vec!["pkg-2.0.zip"]);
        assert_eq!(plan.conventional, 2);
        assert!((plan.size_to_remove - 0.002).abs() < 1e-12);
        assert!((plan.total_size - 0.003).abs() < 1e-12);
        assert_eq!(
            plan.size_line(),
            "Purging outdated packages will remove 0.002 GB / 0.003 GB of package data"
        );
    }

    #[test]
    fn non_conventional_records_never_outdated_directly() {
        let packages = mb(&[
            "/etc/packages/acme/pkg.zip",
            "/etc/packages/acme/pkg-1.0.zip",
            "/etc/packages/acme/pkg-1.1.zip",
            "/etc/packages/acme/pkg-1.0/.snapshot/pkg-1.0.zip",
            "/etc/packages/acme/tool-1.0-SNAPSHOT.zip",
        ]);
        let plan = PurgePlan::build(&packages, &quiet());
        assert_eq!(paths(&plan.outdated), vec!["/etc/packages/acme/pkg-1.0.zip"]);
        assert!(plan
            .outdated
            .iter()
            .all(|package| package.is_conventional()));
    }

    #[test]
    fn nothing_outdated_means_empty_plan() {
        let packages = mb(&["a-1.0.zip", "b-2.0.zip", "readme.txt"]);
        let plan = PurgePlan::build(&packages, &quiet());
        assert!(plan.is_empty());
        assert_eq!(plan.removals().count(), 0);
    }

    #[test]
    fn ledgers_list_retained_and_removed_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let packages = mb(&[
            "/p/pkg-1.0.zip",
            "/p/pkg-2.0.zip",
            "/p/pkg-1.0/.snapshot/pkg-1.0.zip",
        ]);
        let plan = PurgePlan::build(&packages, &quiet());
        let written = write_ledgers(&plan, &dir.path().join("work")).expect("ledgers");

        let retain = fs::read_to_string(&written.retain).expect("retain");
        let remove = fs::read_to_string(&written.remove).expect("remove");
        assert_eq!(retain, "/p/pkg-2.0.zip\n");
        assert_eq!(remove, "/p/pkg-1.0.zip\n/p/pkg-1.0/.snapshot/pkg-1.0.zip\n");

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written.plan).expect("plan"))
                .expect("plan json");
        assert_eq!(document["outdated"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn forced_purge_continues_past_failures() {
        let packages = mb(&[
            "/p/a-1.0.zip",
            "/p/a-2.0.zip",
            "/p/b-1.0.zip",
            "/p/b-1.1.zip",
            "/p/c-0.1.zip",
            "/p/c-0.2.zip",
        ]);
        let plan = PurgePlan::build(&packages, &quiet());
        let remover = ScriptedRemover::new(vec!["/p/a-1.0.zip"], vec!["/p/b-1.0.zip"]);
        let options = PurgeOptions {
            force: true,
            verbose: false,
        };
        let mut input = "".as_bytes();
        let mut output = Vec::new();

        let report = block_on(purge_packages(
            &plan,
            &remover,
            &options,
            &mut input,
            &mut output,
            &quiet(),
        ))
        .expect("purge completes");

        assert_eq!(
            *remover.calls.borrow(),
            vec!["/p/a-1.0.zip", "/p/b-1.0.zip", "/p/c-0.1.zip"]
        );
        assert_eq!(
            report,
            PurgeReport {
                deleted: 1,
                failed: 2,
                skipped: 0
            }
        );
        let printed = String::from_utf8(output).expect("utf8");
        assert!(printed.contains("Deleting /p/a-1.0.zip\nFailed: Network:"));
        assert!(printed.contains("Deleting /p/b-1.0.zip\nFailed\n"));
        assert!(printed.contains("Deleting /p/c-0.1.zip\nDone\n"));
        assert!(matches!(
            report.into_result(),
            Err(PurgeError::PartialPurge {
                failed: 2,
                attempted: 3
            })
        ));
    }

    #[test]
    fn per_item_confirmation_skips_and_aborts() {
        let packages = mb(&[
            "/p/a-1.0.zip",
            "/p/a-2.0.zip",
            "/p/b-1.0.zip",
            "/p/b-2.0.zip",
            "/p/c-1.0.zip",
            "/p/c-2.0.zip",
        ]);
        let plan = PurgePlan::build(&packages, &quiet());
        let remover = ScriptedRemover::new(Vec::new(), Vec::new());
        let options = PurgeOptions {
            force: false,
            verbose: false,
        };
        let mut input = "n\ny\nmaybe\n".as_bytes();
        let mut output = Vec::new();

        let result = block_on(purge_packages(
            &plan,
            &remover,
            &options,
            &mut input,
            &mut output,
            &quiet(),
        ));

        assert!(matches!(result, Err(PurgeError::Aborted(_))));
        assert_eq!(*remover.calls.borrow(), vec!["/p/b-1.0.zip"]);
        let printed = String::from_utf8(output).expect("utf8");
        assert!(printed.contains("Skipping /p/a-1.0.zip"));
        assert!(printed.contains(
            "Input not recognized. Aborting operation\nDeleted 1 package(s), 0 failed, 1 skipped\n"
        ));
    }

    #[test]
    fn clean_purge_is_ok() {
        let report = PurgeReport {
            deleted: 3,
            failed: 0,
            skipped: 1,
        };
        assert_eq!(report.clone().into_result().expect("ok"), report);
    }
}
