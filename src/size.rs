/*============================================================
  Synavera Project: AEM-Purge
  Module: aem_purge::size
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Convert human-readable package sizes to gigabytes, sum
    them, and format totals for the purge report.

  Security / Safety Notes:
    Pure computation; malformed sizes are skipped silently.

  Dependencies:
    regex for `<integer> <unit>` size strings.

  Operational Scope:
    Used twice per run: over the whole repository and over
    the records scheduled for removal.

  Revision History:
    2025-11-12 COD  Authored size accountant.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Unknown units contribute zero rather than failing
    - Small totals keep two significant fractional digits
============================================================*/

use std::sync::OnceLock;

use regex::Regex;

use crate::record::PackageRecord;

fn size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s(\w{2})\s*$")
            .unwrap_or_else(|err| panic!("invalid size pattern: {err}"))
    })
}

fn unit_coefficient(unit: &str) -> Option<f64> {
    match unit {
        "KB" => Some(0.000_001),
        "MB" => Some(0.001),
        "GB" => Some(1.0),
        _ => None,
    }
}

/// Size of one entry in GB, or `None` if the string is not understood.
pub fn parse_size_gb(raw: &str) -> Option<f64> {
    let captures = size_pattern().captures(raw)?;
    let number = captures.get(1)?.as_str().parse::<u64>().ok()?;
    let coefficient = unit_coefficient(captures.get(2)?.as_str())?;
    Some(number as f64 * coefficient)
}

/// Sum of all parseable record sizes in GB.
pub fn calculate_size<'a, I>(packages: I) -> f64
where
    I: IntoIterator<Item = &'a PackageRecord>,
{
    packages
        .into_iter()
        .filter_map(|package| parse_size_gb(&package.size))
        .sum()
}

/// Decimal places used for both figures of the freed-space line:
/// the leading zeros of the fractional part plus two.
pub fn display_precision(value: f64) -> usize {
    let text = value.to_string();
    match text.split_once('.') {
        Some((_, fraction)) => {
            let leading_zeros = fraction.len() - fraction.trim_start_matches('0').len();
            leading_zeros + 2
        }
        None => 1,
    }
}

/// Round `value` to `places` decimals, dropping redundant trailing zeros
/// but always keeping one fractional digit.
pub fn format_gb(value: f64, places: usize) -> String {
    let fixed = format!("{value:.places$}");
    if !fixed.contains('.') {
        return format!("{fixed}.0");
    }
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn sums_known_units_and_skips_garbage() {
        let packages = vec![
            PackageRecord::new("a", "500 MB"),
            PackageRecord::new("b", "2 GB"),
            PackageRecord::new("c", "bogus"),
        ];
        assert!(approx(calculate_size(&packages), 2.5));
    }

    #[test]
    fn unit_coefficients() {
        assert!(approx(parse_size_gb("1 KB").unwrap_or_default(), 0.000_001));
        assert!(approx(parse_size_gb("12 MB").unwrap_or_default(), 0.012));
        assert!(approx(parse_size_gb("3 GB").unwrap_or_default(), 3.0));
    }

    #[test]
    fn rejects_unknown_or_malformed() {
        assert_eq!(parse_size_gb("4 TB"), None);
        assert_eq!(parse_size_gb("12MB"), None);
        assert_eq!(parse_size_gb("1.5 MB"), None);
        assert_eq!(parse_size_gb(""), None);
        assert_eq!(parse_size_gb("12 mb"), None);
    }

    #[test]
    fn empty_input_sums_to_zero() {
        let packages: Vec<PackageRecord> = Vec::new();
        assert_eq!(calculate_size(&packages), 0.0);
    }

    #[test]
    fn precision_tracks_leading_fractional_zeros() {
        assert_eq!(display_precision(0.000002), 7);
        assert_eq!(display_precision(0.0123), 3);
        assert_eq!(display_precision(2.5), 2);
        assert_eq!(display_precision(3.0), 1);
    }

    #[test]
    fn small_totals_are_not_rounded_away() {
        let places = display_precision(0.000002);
        assert_eq!(format_gb(0.000002, places), "0.000002");
        assert_eq!(format_gb(2.5, places), "2.5");
    }

    #[test]
    fn formatting_keeps_a_fractional_digit() {
        assert_eq!(format_gb(3.0, 1), "3.0");
        assert_eq!(format_gb(12.3456, 2), "12.35");
        assert_eq!(format_gb(7.0, 0), "7.0");
        assert_eq!(format_gb(0.0, 1), "0.0");
    }
}
