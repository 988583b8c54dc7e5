//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::core::weibull::WindowPolicy;
use crate::core::{Config, Project};
use crate::entities::forecast::Estimator;

/// Snapshot file created by `pcf init`
pub const DEFAULT_SNAPSHOT: &str = "snapshot.yaml";

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Group the integer part of a number with thousands separators
fn group_thousands(value: f64) -> String {
    let rounded = value.abs().round();
    let digits = format!("{:.0}", rounded);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0.0 && rounded > 0.0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// Format a cost rounded to whole units, e.g. `1,234,567 KRW`
pub fn format_cost(value: f64, currency: &str) -> String {
    let grouped = group_thousands(value);
    if currency.is_empty() {
        grouped
    } else {
        format!("{} {}", grouped, currency)
    }
}

/// Format a probability in `[0, 1]` as a percentage with two decimals
pub fn format_percent(probability: f64) -> String {
    format!("{:.2} %", probability * 100.0)
}

/// Format a plain number with thousands separators, keeping whole numbers short
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        group_thousands(value)
    } else {
        format!("{}", value)
    }
}

/// Estimator for this invocation: `--policy` wins over the configured policy
pub fn estimator(global: &GlobalOpts, config: &Config) -> Estimator {
    let policy: WindowPolicy = global.policy.unwrap_or_else(|| config.policy());
    tracing::debug!(%policy, "using window policy");
    Estimator::new(policy)
}

/// clap value parser for probabilities given as fractions in `[0, 1]`
pub fn parse_probability(raw: &str) -> std::result::Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{value} is outside 0-1 (use a fraction, e.g. 0.5 for 50%)"
        ))
    }
}

/// Horizon in days: explicit flag, then the snapshot's own value, then config
pub fn horizon_days(flag: Option<u32>, snapshot: Option<u32>, config: &Config) -> u32 {
    flag.or(snapshot)
        .filter(|&d| d > 0)
        .unwrap_or_else(|| config.horizon_days())
}

/// Use the given snapshot path, or the project's default snapshot
pub fn resolve_snapshot(path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = path {
        return Ok(path);
    }

    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let default = project.data_dir().join(DEFAULT_SNAPSHOT);
    if !default.exists() {
        return Err(miette::miette!(
            help = "Pass a snapshot file explicitly, e.g. `pcf forecast data/units.csv`",
            "No snapshot given and {} does not exist",
            default.display()
        ));
    }
    Ok(default)
}

/// Write to a file when a path is given, otherwise to stdout
pub fn write_output(content: &str, output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
            eprintln!("Written to: {}", path.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}

/// Serialize a value as pretty JSON or YAML
pub fn to_structured<T: serde::Serialize>(value: &T, json: bool) -> Result<String> {
    if json {
        let mut out = serde_json::to_string_pretty(value).into_diagnostic()?;
        out.push('\n');
        Ok(out)
    } else {
        serde_yml::to_string(value).into_diagnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(750_000.0, ""), "750,000");
        assert_eq!(format_cost(1_234_567.4, "KRW"), "1,234,567 KRW");
        assert_eq!(format_cost(999.6, ""), "1,000");
        assert_eq!(format_cost(0.0, ""), "0");
        assert_eq!(format_cost(-1500.0, ""), "-1,500");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.123456), "12.35 %");
        assert_eq!(format_percent(1.0), "100.00 %");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(12500.0), "12,500");
        assert_eq!(format_number(1.5), "1.5");
    }

    #[test]
    fn test_parse_probability_range() {
        assert_eq!(parse_probability("0"), Ok(0.0));
        assert_eq!(parse_probability("0.25"), Ok(0.25));
        assert_eq!(parse_probability("1"), Ok(1.0));
        assert!(parse_probability("50").unwrap_err().contains("outside 0-1"));
        assert!(parse_probability("-0.1").is_err());
        assert!(parse_probability("NaN").is_err());
        assert!(parse_probability("half").unwrap_err().contains("not a number"));
    }

    #[test]
    fn test_horizon_days_precedence() {
        let config = Config {
            horizon_days: Some(60),
            ..Default::default()
        };
        assert_eq!(horizon_days(Some(30), Some(90), &config), 30);
        assert_eq!(horizon_days(None, Some(90), &config), 90);
        assert_eq!(horizon_days(None, None, &config), 60);
        assert_eq!(horizon_days(Some(0), None, &config), 60);
    }
}
