//! `pcf rank` command - units ordered by failure probability
//!
//! CSV output uses the evidence layout
//! `part_id,serial,age_hours,beta,eta,prob_percent`.

use chrono::{DateTime, Utc};
use console::style;
use indexmap::IndexMap;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{self, to_structured, write_output};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::weibull::WindowPolicy;
use crate::core::{load_snapshot, Config, Snapshot};
use crate::entities::forecast::Estimator;
use crate::entities::ranking::{RankOptions, RankedUnit};
use crate::entities::unit::{HorizonWindow, UnitObservation};

#[derive(clap::Args, Debug)]
pub struct RankArgs {
    /// Snapshot file (.yaml, .json or units .csv); default: data/snapshot.yaml
    pub snapshot: Option<PathBuf>,

    /// Only rank this part type
    #[arg(long, short = 'p')]
    pub part: Option<String>,

    /// Forecast horizon in days (default: snapshot, then config)
    #[arg(long)]
    pub horizon_days: Option<u32>,

    /// Keep at most N units per part (default: config top_n)
    #[arg(long, short = 'n', conflicts_with = "all")]
    pub top_n: Option<usize>,

    /// Show every unit instead of the top N
    #[arg(long)]
    pub all: bool,

    /// Drop units below this failure probability (0-1)
    #[arg(long = "min-prob", value_parser = helpers::parse_probability)]
    pub min_probability: Option<f64>,

    /// Write output to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Ranked units per part type
#[derive(Debug, Clone, Serialize)]
pub struct RankReport {
    pub generated_at: DateTime<Utc>,
    pub horizon_days: u32,
    pub policy: WindowPolicy,
    pub parts: IndexMap<String, Vec<RankedUnit>>,
}

/// Rank every part (or the selected one) of a snapshot
pub fn rank_snapshot(
    snapshot: &Snapshot,
    estimator: &Estimator,
    horizon: HorizonWindow,
    options: &RankOptions,
    part: Option<&str>,
) -> IndexMap<String, Vec<RankedUnit>> {
    let mut units: IndexMap<&str, Vec<UnitObservation>> = IndexMap::new();

    for group in &snapshot.parts {
        if part.is_some_and(|p| p != group.part_id) {
            continue;
        }
        // Repeated part ids are ranked together
        units
            .entry(group.part_id.as_str())
            .or_default()
            .extend(group.units.iter().cloned());
    }

    units
        .into_iter()
        .map(|(part_id, units)| (part_id.to_string(), estimator.rank(&units, horizon, options)))
        .collect()
}

pub fn run(args: RankArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let estimator = helpers::estimator(global, &config);

    let path = helpers::resolve_snapshot(args.snapshot)?;
    let snapshot = load_snapshot(&path)?;

    let days = helpers::horizon_days(args.horizon_days, snapshot.horizon_days, &config);
    let horizon = HorizonWindow::from_days(days);

    let options = RankOptions {
        top_n: if args.all {
            None
        } else {
            Some(args.top_n.unwrap_or_else(|| config.top_n()))
        },
        min_probability: args.min_probability.or(config.min_probability),
    };

    if let Some(part) = args.part.as_deref() {
        if snapshot.part(part).is_none() {
            return Err(miette::miette!(
                "Part '{}' not found in {}",
                part,
                path.display()
            ));
        }
    }

    let parts = rank_snapshot(&snapshot, &estimator, horizon, &options, args.part.as_deref());
    let format = global.format.resolve(config.default_format.as_deref());
    let output = args.output.as_deref();

    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let report = RankReport {
                generated_at: Utc::now(),
                horizon_days: days,
                policy: estimator.policy,
                parts,
            };
            write_output(&to_structured(&report, format == OutputFormat::Json)?, output)
        }
        OutputFormat::Csv | OutputFormat::Tsv => {
            write_output(&render_evidence(&parts, format), output)
        }
        _ => {
            let mut content = String::new();
            for (part_id, ranked) in &parts {
                if format == OutputFormat::Md {
                    content.push_str(&format!("## {}\n\n", part_id));
                } else if !global.quiet {
                    content.push_str(&format!(
                        "{} {} ({} days, {})\n",
                        style("Part").bold(),
                        style(part_id).cyan().bold(),
                        days,
                        estimator.policy
                    ));
                }

                if ranked.is_empty() {
                    content.push_str("No units to show.\n\n");
                    continue;
                }

                content.push_str(&render_part(ranked, format));
                content.push('\n');
            }
            write_output(&content, output)
        }
    }
}

const PART_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("rank", "#"),
    ColumnDef::new("serial", "S/N"),
    ColumnDef::new("age_hours", "AGE (h)"),
    ColumnDef::new("beta", "BETA"),
    ColumnDef::new("eta", "ETA (h)"),
    ColumnDef::new("prob_percent", "P (%)"),
];

fn render_part(ranked: &[RankedUnit], format: OutputFormat) -> String {
    let rows: Vec<TableRow> = ranked
        .iter()
        .enumerate()
        .map(|(i, unit)| {
            TableRow::new()
                .cell(CellValue::Number((i + 1) as f64))
                .text(unit.serial.clone())
                .cell(CellValue::Number(unit.age_hours))
                .cell(CellValue::Number(unit.beta))
                .cell(CellValue::Number(unit.eta))
                .cell(CellValue::Percent(unit.probability))
        })
        .collect();

    TableFormatter::new(PART_COLUMNS).render(&rows, format)
}

const EVIDENCE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("part_id", "PART"),
    ColumnDef::new("serial", "S/N"),
    ColumnDef::new("age_hours", "AGE (h)"),
    ColumnDef::new("beta", "BETA"),
    ColumnDef::new("eta", "ETA (h)"),
    ColumnDef::new("prob_percent", "P (%)"),
];

/// One evidence row per ranked unit across all parts
pub fn render_evidence(parts: &IndexMap<String, Vec<RankedUnit>>, format: OutputFormat) -> String {
    let rows: Vec<TableRow> = parts
        .iter()
        .flat_map(|(part_id, ranked)| {
            ranked.iter().map(move |unit| {
                TableRow::new()
                    .text(part_id.clone())
                    .text(unit.serial.clone())
                    .cell(CellValue::Number(unit.age_hours))
                    .cell(CellValue::Number(unit.beta))
                    .cell(CellValue::Number(unit.eta))
                    .cell(CellValue::Percent(unit.probability))
            })
        })
        .collect();

    TableFormatter::new(EVIDENCE_COLUMNS).render(&rows, format)
}
