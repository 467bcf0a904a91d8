/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise AEM-Purge error types so fetch, delete, prompt
    and persistence failures share one exit-code table.

  Security / Safety Notes:
    Error contexts never embed credentials; only hosts and
    repository paths are exposed.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate recoverable failures and
    consolidate exit codes for the binary entry point.

  Revision History:
    2025-11-12 COD  Established purge error taxonomy.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths outside the pure engine
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for AEM-Purge operations.
pub type Result<T> = std::result::Result<T, PurgeError>;

/// Enumerates high-level error domains surfaced by AEM-Purge.
#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Network: {0}")]
    Network(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Aborted: {0}")]
    Aborted(String),
    #[error("Purge incomplete: {failed} of {attempted} deletions failed")]
    PartialPurge { failed: usize, attempted: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PurgeError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    pub fn exit_status(&self) -> u8 {
        match self {
            PurgeError::Aborted(_) => 2,
            PurgeError::Config(_) => 20,
            PurgeError::Network(_) => 30,
            PurgeError::Serialization(_) => 31,
            PurgeError::Filesystem(_) => 40,
            PurgeError::Io(_) => 41,
            PurgeError::PartialPurge { .. } => 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_is_distinct_from_success_and_network() {
        let aborted = PurgeError::Aborted("input not recognized".into());
        let network = PurgeError::Network("connection refused".into());
        assert_eq!(aborted.exit_status(), 2);
        assert_ne!(aborted.exit_status(), network.exit_status());
    }

    #[test]
    fn partial_purge_reports_counts() {
        let err = PurgeError::PartialPurge {
            failed: 2,
            attempted: 5,
        };
        assert_eq!(
            err.to_string(),
            "Purge incomplete: 2 of 5 deletions failed"
        );
        assert_eq!(err.exit_status(), 60);
    }
}
