/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load the optional TOML configuration file, merge command
    line overrides, and validate the effective run settings.

  Security / Safety Notes:
    Credentials are held in memory only and are redacted
    whenever the effective configuration is echoed.

  Dependencies:
    serde + toml for the file layer, dirs for default paths,
    regex and chrono for validation.

  Operational Scope:
    Constructed once in `main` and passed by reference to the
    client, planner and logger.

  Revision History:
    2025-11-12 COD  Authored configuration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Validation is pure and reports every violation
    - Explicit precedence: CLI > file > defaults
============================================================*/

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::Deserialize;

use crate::error::{PurgeError, Result};

pub const DEFAULT_HOST: &str = "localhost:4502";
pub const DEFAULT_USER: &str = "admin:admin";
pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DATE_FORMAT: &str = "%Y-%m-%d";
const APP_DIR: &str = "aem-purge";

/// On-disk configuration file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub remote: RemoteSection,
    pub paths: PathsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteSection {
    pub host: Option<String>,
    pub user: Option<String>,
    pub scheme: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub work_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Load from `path` when given, otherwise from the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is
    /// an error.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => Self::load(explicit),
            None => match default_config_path() {
                Some(candidate) if candidate.is_file() => Self::load(&candidate),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            PurgeError::Config(format!(
                "Failed to read configuration {}: {err}",
                path.display()
            ))
        })?;
        toml::from_str(&raw).map_err(|err| {
            PurgeError::Config(format!(
                "Failed to parse configuration {}: {err}",
                path.display()
            ))
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Values supplied on the command line; `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub date: Option<String>,
    pub path: Option<String>,
    pub host: Option<String>,
    pub user: Option<String>,
    pub timeout_secs: Option<u64>,
    pub force: bool,
    pub verbose: bool,
    pub dry_run: bool,
}

/// Basic-auth credentials split from `user:password`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Split on the first `:`; `None` when there is no separator.
    pub fn parse(raw: &str) -> Option<Self> {
        let (username, password) = raw.split_once(':')?;
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn redacted(&self) -> String {
        format!("{}:****", self.username)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Effective settings for one purge run.
#[derive(Debug, Clone)]
pub struct PurgeConfig {
    /// Upper bound on package creation date, `YYYY-MM-DD`.
    pub date: String,
    /// Sub-path below `/etc/packages`; empty means all packages.
    pub path: String,
    pub host: String,
    pub user: String,
    pub scheme: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub work_dir: PathBuf,
    pub log_dir: PathBuf,
    pub force: bool,
    pub verbose: bool,
    pub dry_run: bool,
}

impl PurgeConfig {
    /// Merge CLI overrides over file values over built-in defaults.
    pub fn resolve(file: FileConfig, cli: CliOverrides) -> Self {
        let FileConfig { remote, paths } = file;
        Self {
            date: cli.date.unwrap_or_else(today),
            path: cli.path.unwrap_or_default(),
            host: cli
                .host
                .or(remote.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            user: cli
                .user
                .or(remote.user)
                .unwrap_or_else(|| DEFAULT_USER.to_string()),
            scheme: remote.scheme.unwrap_or_else(|| DEFAULT_SCHEME.to_string()),
            timeout_secs: cli
                .timeout_secs
                .or(remote.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            user_agent: remote
                .user_agent
                .unwrap_or_else(|| format!("AEM-Purge/{}", env!("CARGO_PKG_VERSION"))),
            work_dir: paths.work_dir.unwrap_or_else(default_work_dir),
            log_dir: paths.log_dir.unwrap_or_else(default_log_dir),
            force: cli.force,
            verbose: cli.verbose,
            dry_run: cli.dry_run,
        }
    }

    /// Credentials, if `user` is well formed.
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::parse(&self.user)
    }

    /// `name = value` lines for the verbose echo, password redacted.
    pub fn effective_values(&self) -> Vec<(&'static str, String)> {
        let user = self
            .credentials()
            .map(|creds| creds.redacted())
            .unwrap_or_else(|| "<invalid>".to_string());
        vec![
            ("date", self.date.clone()),
            ("path", self.path.clone()),
            ("host", self.host.clone()),
            ("user", user),
            ("scheme", self.scheme.clone()),
            ("timeout", format!("{}s", self.timeout_secs)),
            ("work_dir", self.work_dir.display().to_string()),
            ("force", self.force.to_string()),
            ("dry_run", self.dry_run.to_string()),
        ]
    }
}

/// Local calendar date in `YYYY-MM-DD` form.
pub fn today() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("package-purge")
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("logs")
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid validation pattern {pattern}: {err}"))
}

/// Every rule the configuration breaks; empty when it is usable.
pub fn validate(config: &PurgeConfig) -> Vec<String> {
    let mut violations = Vec::new();

    let date_shape = compile(r"^\d{4}-\d{2}-\d{2}$");
    if !date_shape.is_match(&config.date)
        || NaiveDate::parse_from_str(&config.date, DATE_FORMAT).is_err()
    {
        violations.push(format!(
            "date argument value ({}) is invalid; expected YYYY-MM-DD",
            config.date
        ));
    }

    let path_shape = compile(r"^[\w.\-]+(?:/[\w.\-]+)*/?$");
    let escapes_root = config.path.split('/').any(|segment| segment == "..");
    if !config.path.is_empty() && (!path_shape.is_match(&config.path) || escapes_root) {
        violations.push(format!("path argument value ({}) is invalid", config.path));
    }

    let host_shape = compile(r"^[\w.\-]+(?::\d{1,5})?$");
    if !host_shape.is_match(&config.host) {
        violations.push(format!(
            "host argument value ({}) is invalid; expected host[:port]",
            config.host
        ));
    }

    match config.credentials() {
        Some(creds) if !creds.username.is_empty() => {}
        _ => violations.push("user argument value is invalid; expected user:pass".to_string()),
    }

    if config.scheme != "http" && config.scheme != "https" {
        violations.push(format!(
            "scheme ({}) is invalid; expected http or https",
            config.scheme
        ));
    }

    if config.timeout_secs == 0 {
        violations.push("timeout must be greater than zero".to_string());
    }

    violations
}
