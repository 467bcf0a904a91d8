/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::record
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Shared structure describing one stored package (or package
    snapshot) as reported by the remote query API.

  Security / Safety Notes:
    Pure data container; no I/O performed in this module.

  Dependencies:
    serde for ledger and response serialization.

  Operational Scope:
    Passed between the query client, the decision engine and
    the purge planner for the lifetime of a single run.

  Revision History:
    2025-11-12 COD  Introduced shared PackageRecord type.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Derived properties computed, never stored
============================================================*/

use serde::{Deserialize, Serialize};

use crate::version::parse_conventional;

/// Path segment under which the repository keeps package snapshots.
pub const SNAPSHOT_SEGMENT: &str = ".snapshot";

/// A stored package entry: repository path plus human-readable size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub path: String,
    #[serde(default)]
    pub size: String,
}

impl PackageRecord {
    pub fn new(path: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: size.into(),
        }
    }

    /// True when the path runs through a `.snapshot` segment.
    pub fn is_snapshot(&self) -> bool {
        self.path.split('/').any(|segment| segment == SNAPSHOT_SEGMENT)
    }

    /// True for non-snapshot records following `<family>-<version>.zip`.
    pub fn is_conventional(&self) -> bool {
        !self.is_snapshot() && parse_conventional(&self.path).is_some()
    }
}
