/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::version
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Split conventional package paths into family identity and
    dotted version tokens, and order token sequences.

  Security / Safety Notes:
    Pure string handling; no I/O performed in this module.

  Dependencies:
    regex for the `<family>-<version>.zip` naming convention.

  Operational Scope:
    Feeds the best-version selector with grouping keys and a
    numeric, per-segment ordering.

  Revision History:
    2025-11-12 COD  Authored version token parser and comparator.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Parse failures modelled as absence, not errors
    - Deterministic ordering for unequal-length versions
============================================================*/

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

fn conventional_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.*-)(\d{1,4}(?:\.\d{1,4}){0,3})\.zip$")
            .unwrap_or_else(|err| panic!("invalid conventional package pattern: {err}"))
    })
}

/// Family identity and version tokens extracted from a conventional path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalName {
    /// Path prefix up to and including the final `-`.
    pub family: String,
    /// Raw digit groups, leading zeros preserved.
    pub tokens: Vec<String>,
}

impl ConventionalName {
    /// Rebuild the path this name was parsed from.
    pub fn reconstruct(&self) -> String {
        format!("{}{}.zip", self.family, self.tokens.join("."))
    }
}

/// Parse `<family>-<v1>[.<v2>][.<v3>][.<v4>].zip`; `None` when the path
/// does not follow the convention.
pub fn parse_conventional(path: &str) -> Option<ConventionalName> {
    let captures = conventional_pattern().captures(path)?;
    let family = captures.get(1)?.as_str().to_string();
    let tokens = captures
        .get(2)?
        .as_str()
        .split('.')
        .map(str::to_string)
        .collect();
    Some(ConventionalName { family, tokens })
}

/// Compare two token sequences segment by segment as integers.
///
/// Sequences of different length are compared over the longer one, with
/// missing segments read as `0`, so `1.0` and `1.0.0` are equal and
/// `1.0.1` is greater than `1.0`.
pub fn compare_versions<A, B>(a: &[A], b: &[B]) -> Ordering
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let width = a.len().max(b.len());
    for index in 0..width {
        let left = segment_value(a.get(index).map(AsRef::as_ref));
        let right = segment_value(b.get(index).map(AsRef::as_ref));
        match left.cmp(&right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Segments hold at most four digits, so `u32` cannot overflow.
fn segment_value(token: Option<&str>) -> u32 {
    token
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(0)
}
