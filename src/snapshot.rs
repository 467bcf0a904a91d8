/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::snapshot
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Correlate `.snapshot` records with the outdated packages
    whose deletion removes them.

  Security / Safety Notes:
    Pure computation; snapshots are never submitted for
    deletion themselves.

  Dependencies:
    std collections only.

  Operational Scope:
    Used by the purge planner so freed-space figures include
    snapshot copies.

  Revision History:
    2025-11-12 COD  Authored snapshot correlator.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Matching by terminal file name only
    - Paths without a `.zip` file name never correlate
============================================================*/

use std::collections::HashSet;

use crate::record::PackageRecord;

/// Terminal `*.zip` file name of a path. A bare file name is its own
/// terminal component.
pub fn package_file_name(path: &str) -> Option<&str> {
    let file = path.rsplit_once('/').map_or(path, |(_, file)| file);
    let end = file.rfind(".zip")? + ".zip".len();
    Some(&file[..end])
}

/// Snapshot records sharing a file name with any outdated record.
///
/// Matching looks at the terminal file name only, so a snapshot under one
/// group is counted whenever a same-named package in another group is
/// outdated, even if that group keeps its own copy.
pub fn find_outdated_snapshots(
    packages: &[PackageRecord],
    outdated: &[PackageRecord],
) -> Vec<PackageRecord> {
    let names: HashSet<&str> = outdated
        .iter()
        .filter_map(|package| package_file_name(&package.path))
        .collect();
    if names.is_empty() {
        return Vec::new();
    }

    packages
        .iter()
        .filter(|package| package.is_snapshot())
        .filter(|package| {
            package_file_name(&package.path)
                .map(|name| names.contains(name))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}
