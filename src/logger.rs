/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::logger
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Provide structured, append-only logging for purge runs,
    separate from the operator-facing report on stdout.

  Security / Safety Notes:
    Callers never pass credentials; repository paths and
    hosts are the only identifiers logged.

  Dependencies:
    chrono for UTC stamps, sha2 for session digests.

  Operational Scope:
    One logger per run; the session file is sealed with a
    SHA-256 digest once the run completes.

  Revision History:
    2025-11-12 COD  Adapted Synavera logger for AEM-Purge.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Append-only logging with UTC timestamps
    - Deterministic formatting for auditability
    - Graceful error propagation on I/O failures
============================================================*/

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::{PurgeError, Result};

/// Structured log level for purge events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }

    fn always_echoed(self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Error)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session log file name for a run started at `started`.
pub fn session_log_path(dir: &Path, started: DateTime<Utc>) -> PathBuf {
    dir.join(format!("purge_{}.log", started.format("%Y-%m-%d_%H-%M-%S")))
}

fn format_entry(timestamp: &str, level: LogLevel, code: &str, message: &str) -> String {
    format!("{timestamp} [{level}] [{code}] {message}")
}

/// Logger that echoes to stderr and optionally appends to a session file.
pub struct Logger {
    file: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
    verbose: bool,
}

impl Logger {
    /// Build a logger; `path` enables the session file.
    pub fn new(path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let file = match path.as_deref() {
            Some(file_path) => Some(Mutex::new(BufWriter::new(open_append(file_path)?))),
            None => None,
        };

        Ok(Self {
            file,
            path,
            verbose,
        })
    }

    /// Emit a log entry with the given level, code, and message.
    pub fn log<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let entry = format_entry(&timestamp, level, code, message.as_ref());

        if self.verbose || level.always_echoed() {
            eprintln!("{entry}");
        }

        let Some(file) = &self.file else {
            return;
        };
        if let Ok(mut guard) = file.lock() {
            if writeln!(guard, "{entry}").and_then(|_| guard.flush()).is_err() {
                eprintln!(
                    "{}",
                    format_entry(
                        &timestamp,
                        LogLevel::Error,
                        "LOGGER",
                        "Failed to write to log file"
                    )
                );
            }
        }
    }

    pub fn info<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Info, code, message);
    }

    pub fn warn<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Warn, code, message);
    }

    pub fn error<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Error, code, message);
    }

    pub fn debug<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Debug, code, message);
    }

    /// Return the path backing this logger, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write `<log>.hash` holding the SHA-256 of the session file.
    ///
    /// Returns the digest path, or `None` when logging to stderr only.
    pub fn finalize(&self) -> Result<Option<PathBuf>> {
        let Some(path) = self.path() else {
            return Ok(None);
        };
        if let Some(file) = &self.file {
            if let Ok(mut guard) = file.lock() {
                guard.flush()?;
            }
        }

        let data = std::fs::read(path).map_err(|err| {
            PurgeError::Filesystem(format!(
                "Failed to read log for hashing {}: {err}",
                path.display()
            ))
        })?;
        let digest = Sha256::digest(&data);

        let mut hash_os = path.as_os_str().to_os_string();
        hash_os.push(".hash");
        let hash_path = PathBuf::from(hash_os);
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        std::fs::write(&hash_path, format!("{digest:x}  {name}\n")).map_err(|err| {
            PurgeError::Filesystem(format!(
                "Failed to write hash file {}: {err}",
                hash_path.display()
            ))
        })?;
        Ok(Some(hash_path))
    }
}

fn open_append(file_path: &Path) -> Result<File> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            PurgeError::Filesystem(format!(
                "Failed to create log directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)
        .map_err(|err| {
            PurgeError::Filesystem(format!(
                "Failed to open log file {}: {err}",
                file_path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn entries_follow_fixed_layout() {
        assert_eq!(
            format_entry("2025-01-02T03:04:05Z", LogLevel::Warn, "DELETE", "x failed"),
            "2025-01-02T03:04:05Z [WARN] [DELETE] x failed"
        );
    }

    #[test]
    fn session_path_uses_start_time() {
        let started = Utc
            .with_ymd_and_hms(2025, 11, 12, 8, 30, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(
            session_log_path(Path::new("/var/log/purge"), started),
            PathBuf::from("/var/log/purge/purge_2025-11-12_08-30-00.log")
        );
    }

    #[test]
    fn file_logger_appends_and_seals() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("run.log");
        let logger = Logger::new(Some(path.clone()), false).expect("logger");
        logger.info("INIT", "starting");
        logger.debug("OUTDATED", "/etc/packages/pkg-1.0.zip");

        let hash_path = logger
            .finalize()
            .expect("finalize")
            .expect("file-backed logger writes a digest");
        let contents = std::fs::read_to_string(&path).expect("log contents");
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("[INFO] [INIT] starting"));

        let digest = std::fs::read_to_string(hash_path).expect("digest");
        assert!(digest.trim_end().ends_with("  run.log"));
        assert_eq!(digest.split_whitespace().next().map(str::len), Some(64));
    }

    #[test]
    fn stderr_only_logger_has_nothing_to_seal() {
        let logger = Logger::new(None, false).expect("logger");
        logger.warn("TEST", "echoed to stderr");
        assert!(logger.finalize().expect("finalize").is_none());
    }
}
