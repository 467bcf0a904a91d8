/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::packmgr
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Query stored packages through the repository query API and
    delete individual packages through the package manager
    service.

  Security / Safety Notes:
    Sends basic-auth credentials to the configured host only.
    Credentials never appear in URLs or error messages.

  Dependencies:
    reqwest for HTTP, serde for response parsing, urlencoding
    for query parameters and repository path segments.

  Operational Scope:
    The only module with remote side effects. Requests are
    issued one at a time; there is no retry.

  Revision History:
    2025-11-12 COD  Implemented package manager client.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Fatal fetch failures vs. per-item delete failures
    - Structured response parsing with explicit error paths
    - Configurable timeouts
============================================================*/

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use urlencoding::encode;

use crate::config::{Credentials, PurgeConfig};
use crate::error::{PurgeError, Result};
use crate::record::PackageRecord;

/// Root under which the repository stores packages.
pub const PACKAGES_ROOT: &str = "/etc/packages";

/// Records returned by one query, with the server-reported count.
#[derive(Debug, Clone)]
pub struct PackageListing {
    pub total: u64,
    pub packages: Vec<PackageRecord>,
}

/// Result of a delete call that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: Option<String>,
}

/// Client for the query builder and package manager endpoints.
pub struct PackageManagerClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl PackageManagerClient {
    /// Construct a new client from configuration.
    pub fn new(config: &PurgeConfig) -> Result<Self> {
        let credentials = config
            .credentials()
            .ok_or_else(|| PurgeError::Config("user must be given as user:pass".into()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|err| PurgeError::Network(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url(&config.scheme, &config.host),
            credentials,
        })
    }

    /// Fetch every package under `scope` created on or before `upper_bound`.
    pub async fn fetch_packages(&self, scope: &str, upper_bound: &str) -> Result<PackageListing> {
        let url = query_url(&self.base_url, scope, upper_bound);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await
            .map_err(|err| {
                PurgeError::Network(format!("Package query to {} failed: {err}", self.base_url))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PurgeError::Network(format!(
                "Package query to {} failed with status {status}",
                self.base_url
            )));
        }

        let body = response.text().await.map_err(|err| {
            PurgeError::Network(format!("Failed to read package query response: {err}"))
        })?;
        decode_listing(&body)
    }

    /// Delete one package. Transport errors and non-200 replies are
    /// `Err(Network)`; callers treat them as per-item failures.
    pub async fn delete_package(&self, path: &str) -> Result<DeleteOutcome> {
        let url = delete_url(&self.base_url, path);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await
            .map_err(|err| PurgeError::Network(format!("Delete of {path} failed: {err}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PurgeError::Network(format!(
                "Delete of {path} failed with status {status}"
            )));
        }

        let body = response.text().await.map_err(|err| {
            PurgeError::Network(format!("Failed to read delete response for {path}: {err}"))
        })?;
        decode_delete(&body)
    }
}

fn base_url(scheme: &str, host: &str) -> String {
    format!("{scheme}://{}", host.trim_end_matches('/'))
}

fn query_url(base_url: &str, scope: &str, upper_bound: &str) -> String {
    let scope = scope.trim_matches('/');
    let root = if scope.is_empty() {
        format!("{PACKAGES_ROOT}/")
    } else {
        format!("{PACKAGES_ROOT}/{scope}")
    };
    format!(
        "{base_url}/bin/querybuilder.json?path={}&type=nt:file&p.limit=-1\
         &daterange.property=jcr:created&daterange.upperBound={}",
        encode(&root),
        encode(upper_bound)
    )
}

fn delete_url(base_url: &str, path: &str) -> String {
    let encoded: Vec<_> = path
        .trim_start_matches('/')
        .split('/')
        .map(encode)
        .collect();
    format!(
        "{base_url}/crx/packmgr/service/.json/{}?cmd=delete",
        encoded.join("/")
    )
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: u64,
    #[serde(default)]
    hits: Vec<QueryHit>,
}

#[derive(Debug, Deserialize)]
struct QueryHit {
    path: String,
    #[serde(default)]
    size: Option<String>,
}

fn decode_listing(body: &str) -> Result<PackageListing> {
    let payload: QueryResponse = serde_json::from_str(body).map_err(|err| {
        PurgeError::Serialization(format!("Failed to decode package query response: {err}"))
    })?;
    let packages = payload
        .hits
        .into_iter()
        .map(|hit| PackageRecord::new(hit.path, hit.size.unwrap_or_default()))
        .collect();
    Ok(PackageListing {
        total: payload.results,
        packages,
    })
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    success: bool,
    #[serde(default)]
    msg: Option<String>,
}

fn decode_delete(body: &str) -> Result<DeleteOutcome> {
    let payload: DeleteResponse = serde_json::from_str(body).map_err(|err| {
        PurgeError::Network(format!("Unreadable delete response: {err}"))
    })?;
    Ok(DeleteOutcome {
        success: payload.success,
        message: payload.msg,
    })
}
