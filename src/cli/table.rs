//! Table formatting utilities for CLI output
//!
//! One row model rendered four ways: a boxed table for terminals, Markdown,
//! tab-separated values and CSV. Human formats pretty-print numbers; TSV and
//! CSV carry raw values so they can be piped into other tools.

use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, format_cost, format_number, format_percent, truncate_str};
use crate::cli::OutputFormat;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Plain text, truncated in human formats
    Text(String),
    /// Number shown with thousands separators
    Number(f64),
    /// Float value with precision
    Float(f64, usize),
    /// Probability in [0, 1], shown as a percentage
    Percent(f64),
    /// Monetary amount
    Money(f64),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Human-readable rendering
    pub fn display(&self, currency: &str) -> String {
        match self {
            CellValue::Text(s) => truncate_str(s, 40),
            CellValue::Number(v) => format_number(*v),
            CellValue::Float(v, precision) => format!("{:.*}", *precision, v),
            CellValue::Percent(p) => format_percent(*p),
            CellValue::Money(v) => format_cost(*v, currency),
            CellValue::Empty => "-".to_string(),
        }
    }

    /// Raw value for CSV/TSV (percentages as `12.34`, no grouping)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(v) => v.to_string(),
            CellValue::Float(v, precision) => format!("{:.*}", *precision, v),
            CellValue::Percent(p) => format!("{:.2}", p * 100.0),
            CellValue::Money(v) => format!("{:.2}", v),
            CellValue::Empty => String::new(),
        }
    }
}

/// Column definition: `key` names the column in CSV/TSV, `header` in tables
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str) -> Self {
        Self { key, header }
    }
}

/// A row of cells in column order
#[derive(Debug, Clone, Default)]
pub struct TableRow {
    cells: Vec<CellValue>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, value: CellValue) -> Self {
        self.cells.push(value);
        self
    }

    pub fn text(self, value: impl Into<String>) -> Self {
        self.cell(CellValue::Text(value.into()))
    }

    fn get(&self, idx: usize) -> &CellValue {
        self.cells.get(idx).unwrap_or(&CellValue::Empty)
    }
}

/// Renders rows for a fixed set of columns
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    currency: &'a str,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef]) -> Self {
        Self {
            columns,
            currency: "",
        }
    }

    /// Currency label appended to money cells in human formats
    pub fn with_currency(mut self, currency: &'a str) -> Self {
        self.currency = currency;
        self
    }

    /// Render rows in the given format; structured formats fall back to a table
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_delimited(rows, ","),
            OutputFormat::Tsv => self.render_delimited(rows, "\t"),
            OutputFormat::Md => self.render_tabled(rows, true),
            _ => self.render_tabled(rows, false),
        }
    }

    fn render_tabled(&self, rows: &[TableRow], markdown: bool) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.to_string()));

        for row in rows {
            builder.push_record(
                (0..self.columns.len()).map(|idx| row.get(idx).display(self.currency)),
            );
        }

        let mut table = builder.build();
        if markdown {
            table.with(Style::markdown());
        } else {
            table.with(Style::rounded());
        }

        let mut out = table.to_string();
        out.push('\n');
        out
    }

    fn render_delimited(&self, rows: &[TableRow], delimiter: &str) -> String {
        let escape = |s: String| {
            if delimiter == "," {
                escape_csv(&s)
            } else {
                s.replace(['\t', '\n'], " ")
            }
        };

        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        out.push_str(&header.join(delimiter));
        out.push('\n');

        for row in rows {
            let values: Vec<String> = (0..self.columns.len())
                .map(|idx| escape(row.get(idx).raw()))
                .collect();
            out.push_str(&values.join(delimiter));
            out.push('\n');
        }

        out
    }
}
