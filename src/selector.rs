/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::selector
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Group conventional packages by family, retain the highest
    version of each family and derive the outdated remainder.

  Security / Safety Notes:
    Pure computation over in-memory records.

  Dependencies:
    std collections only.

  Operational Scope:
    Invoked by the purge planner once per run.

  Revision History:
    2025-11-12 COD  Authored best-version selector.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic tie-break (first seen wins)
    - Input order preserved in every derived set
============================================================*/

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::record::PackageRecord;
use crate::version::{compare_versions, parse_conventional, ConventionalName};

/// Keep exactly one record per family: the one with the greatest version.
///
/// Records that do not parse are ignored. When two records of a family carry
/// equal versions, the one seen first stays selected.
pub fn select_best(packages: &[PackageRecord]) -> Vec<PackageRecord> {
    let mut best: HashMap<String, (usize, ConventionalName)> = HashMap::new();

    for (index, package) in packages.iter().enumerate() {
        let Some(name) = parse_conventional(&package.path) else {
            continue;
        };
        match best.get(&name.family) {
            Some((_, current))
                if compare_versions(&current.tokens, &name.tokens) != Ordering::Less => {}
            _ => {
                best.insert(name.family.clone(), (index, name));
            }
        }
    }

    let selected: HashSet<usize> = best.values().map(|(index, _)| *index).collect();
    packages
        .iter()
        .enumerate()
        .filter(|(index, _)| selected.contains(index))
        .map(|(_, package)| package.clone())
        .collect()
}

/// `conventional − best`, matched by path.
pub fn derive_outdated(
    conventional: &[PackageRecord],
    best: &[PackageRecord],
) -> Vec<PackageRecord> {
    let keep: HashSet<&str> = best.iter().map(|package| package.path.as_str()).collect();
    conventional
        .iter()
        .filter(|package| !keep.contains(package.path.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(paths: &[&str]) -> Vec<PackageRecord> {
        paths.iter().map(|path| PackageRecord::new(*path, "1 MB")).collect()
    }

    fn paths(records: &[PackageRecord]) -> Vec<&str> {
        records.iter().map(|record| record.path.as_str()).collect()
    }

    #[test]
    fn keeps_one_highest_version_per_family() {
        let input = records(&[
            "/etc/packages/acme/site-1.0.zip",
            "/etc/packages/acme/site-1.10.zip",
            "/etc/packages/acme/site-1.9.zip",
            "/etc/packages/acme/core-2.0.0.zip",
            "/etc/packages/acme/core-2.0.1.zip",
        ]);
        let best = select_best(&input);
        assert_eq!(
            paths(&best),
            vec![
                "/etc/packages/acme/site-1.10.zip",
                "/etc/packages/acme/core-2.0.1.zip"
            ]
        );
    }

    #[test]
    fn best_dominates_every_family_member() {
        let input = records(&[
            "lib-3.2.zip",
            "lib-3.2.1.zip",
            "lib-3.1.99.zip",
            "lib-3.zip",
        ]);
        let best = select_best(&input);
        assert_eq!(best.len(), 1);
        let winner = parse_conventional(&best[0].path).expect("best parses");
        for record in &input {
            let other = parse_conventional(&record.path).expect("input parses");
            assert_ne!(
                compare_versions(&winner.tokens, &other.tokens),
                Ordering::Less
            );
        }
        assert_eq!(best[0].path, "lib-3.2.1.zip");
    }

    #[test]
    fn equal_versions_keep_first_seen() {
        let input = records(&["pkg-1.1.zip", "pkg-1.01.zip", "pkg-1.1.0.zip"]);
        let best = select_best(&input);
        assert_eq!(paths(&best), vec!["pkg-1.1.zip"]);
    }

    #[test]
    fn outdated_is_difference_by_path() {
        let input = records(&["pkg-1.0.zip", "pkg-2.0.zip", "other-0.1.zip"]);
        let best = select_best(&input);
        let outdated = derive_outdated(&input, &best);
        assert_eq!(paths(&outdated), vec!["pkg-1.0.zip"]);
    }

    #[test]
    fn single_versions_produce_no_outdated() {
        let input = records(&["a-1.0.zip", "b-1.0.zip"]);
        let best = select_best(&input);
        assert!(derive_outdated(&input, &best).is_empty());
    }
}
