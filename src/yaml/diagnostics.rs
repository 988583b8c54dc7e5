//! Snapshot parse diagnostics with source locations

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML or JSON syntax/shape error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("could not parse {kind} snapshot: {message}")]
#[diagnostic(code(pcf::snapshot::syntax))]
pub struct SnapshotSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    kind: &'static str,

    /// The underlying error message
    message: String,
}

impl SnapshotSyntaxError {
    /// Create a syntax error from a serde_yml error
    pub fn from_yaml_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));
        Self::at_location("YAML", err.to_string(), source, filename, line, column)
    }

    /// Create a syntax error from a serde_json error
    pub fn from_json_error(err: &serde_json::Error, source: &str, filename: &str) -> Self {
        Self::at_location(
            "JSON",
            err.to_string(),
            source,
            filename,
            err.line().max(1),
            err.column().max(1),
        )
    }

    fn at_location(
        kind: &'static str,
        message: String,
        source: &str,
        filename: &str,
        line: usize,
        column: usize,
    ) -> Self {
        let offset = line_col_to_offset(source, line, column);
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            kind,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Convert 1-based line/column to a byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut line_start = 0;
    for (idx, text) in source.split_inclusive('\n').enumerate() {
        if idx + 1 == line {
            let within = text
                .char_indices()
                .nth(column.saturating_sub(1))
                .map(|(i, _)| i)
                .unwrap_or(text.len().saturating_sub(1));
            return line_start + within;
        }
        line_start += text.len();
    }
    source.len().saturating_sub(1)
}

/// Suggest a fix based on the parser message
fn generate_help(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("missing field `parts`") {
        return Some("A snapshot needs a top-level `parts:` list of part types.".to_string());
    }

    if msg.contains("missing field `units`") {
        return Some("Every part needs a `units:` list (use `units: []` for none).".to_string());
    }

    if msg.contains("missing field `part_id`") {
        return Some("Every part needs a `part_id`.".to_string());
    }

    if msg.contains("tab") {
        return Some(
            "YAML requires spaces for indentation, not tabs. Replace tabs with spaces.".to_string(),
        );
    }

    if msg.contains("duplicate key") {
        return Some("Each key can only appear once. Remove or rename the duplicate key.".to_string());
    }

    if msg.contains("trailing comma") {
        return Some("JSON does not allow a comma after the last item.".to_string());
    }

    if msg.contains("mapping values are not allowed") {
        return Some("You may be missing a space after ':' or have incorrect indentation.".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_to_offset() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 6);
        assert_eq!(line_col_to_offset(source, 3, 3), 14);
        assert_eq!(line_col_to_offset(source, 9, 1), source.len() - 1);
    }

    #[test]
    fn test_help_generation() {
        assert!(generate_help("missing field `parts`").is_some());
        assert!(generate_help("parts[0]: missing field `units` at line 3").is_some());
        assert!(generate_help("found tab character").is_some());
        assert!(generate_help("some random error").is_none());
    }

    #[test]
    fn test_from_json_error_keeps_message() {
        let source = "{\"parts\": [}";
        let err = serde_json::from_str::<serde_json::Value>(source).unwrap_err();
        let diag = SnapshotSyntaxError::from_json_error(&err, source, "snap.json");
        assert!(!diag.message().is_empty());
        assert!(diag.to_string().contains("JSON"));
    }
}
