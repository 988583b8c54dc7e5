//! `pcf forecast` command - expected replacements and costs per part type

use chrono::{DateTime, Utc};
use console::style;
use indexmap::IndexMap;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{self, format_cost, to_structured, write_output};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::weibull::WindowPolicy;
use crate::core::{load_costs, load_snapshot, Config};
use crate::entities::forecast::{Estimator, FleetForecast, PartGroup, PartTypeForecast, Z_95};
use crate::entities::unit::{HorizonWindow, STANDARD_HORIZON_DAYS};

#[derive(clap::Args, Debug)]
pub struct ForecastArgs {
    /// Snapshot file (.yaml, .json or units .csv); default: data/snapshot.yaml
    pub snapshot: Option<PathBuf>,

    /// Cost table CSV (part_id,unit_cost_mean,unit_cost_std)
    #[arg(long, short = 'c')]
    pub costs: Option<PathBuf>,

    /// Forecast horizon in days (default: snapshot, then config)
    #[arg(long, conflicts_with = "compare_horizons")]
    pub horizon_days: Option<u32>,

    /// Show expected counts for 30, 60, 90 and 180 days side by side
    #[arg(long)]
    pub compare_horizons: bool,

    /// Write output to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Structured forecast output
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub generated_at: DateTime<Utc>,
    pub horizon_days: u32,
    pub horizon_hours: f64,
    pub policy: WindowPolicy,
    pub parts: IndexMap<String, PartTypeForecast>,
    pub grand_total: f64,
}

impl From<FleetForecast> for ForecastReport {
    fn from(fleet: FleetForecast) -> Self {
        Self {
            generated_at: Utc::now(),
            grand_total: fleet.total_cost(),
            horizon_days: fleet.horizon_days,
            horizon_hours: fleet.horizon_hours,
            policy: fleet.policy,
            parts: fleet.parts,
        }
    }
}

/// Expected counts of one part type at each standard horizon
#[derive(Debug, Clone, Serialize)]
pub struct HorizonComparison {
    pub part_id: String,
    /// Horizon days -> expected replacement count
    pub counts: IndexMap<u32, f64>,
    /// Horizon days -> expected total cost
    pub costs: IndexMap<u32, f64>,
}

/// Forecast each part at every standard horizon
pub fn compare_horizons(groups: &[PartGroup], estimator: &Estimator) -> Vec<HorizonComparison> {
    let fleets: Vec<(u32, FleetForecast)> = STANDARD_HORIZON_DAYS
        .iter()
        .map(|&days| (days, estimator.forecast(groups, HorizonWindow::from_days(days))))
        .collect();

    let Some((_, first)) = fleets.first() else {
        return Vec::new();
    };

    first
        .parts
        .keys()
        .map(|part_id| HorizonComparison {
            part_id: part_id.clone(),
            counts: fleets
                .iter()
                .map(|(days, fleet)| (*days, fleet.parts[part_id].expected_replacement_count))
                .collect(),
            costs: fleets
                .iter()
                .map(|(days, fleet)| (*days, fleet.parts[part_id].expected_total_cost))
                .collect(),
        })
        .collect()
}

pub fn run(args: ForecastArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let estimator = helpers::estimator(global, &config);

    let path = helpers::resolve_snapshot(args.snapshot)?;
    let mut snapshot = load_snapshot(&path)?;

    if let Some(costs_path) = &args.costs {
        let costs = load_costs(costs_path)?;
        snapshot.apply_costs(&costs);
    }

    let format = global.format.resolve(config.default_format.as_deref());
    let output = args.output.as_deref();
    let currency = config.currency();

    if args.compare_horizons {
        let comparison = compare_horizons(&snapshot.parts, &estimator);
        if format.is_structured() {
            return write_output(&to_structured(&comparison, format == OutputFormat::Json)?, output);
        }
        return write_output(&render_comparison(&comparison, format, currency), output);
    }

    let days = helpers::horizon_days(args.horizon_days, snapshot.horizon_days, &config);
    let fleet = estimator.forecast(&snapshot.parts, HorizonWindow::from_days(days));
    tracing::info!(
        parts = fleet.parts.len(),
        total_count = fleet.total_count(),
        total_cost = fleet.total_cost(),
        "forecast complete"
    );

    if format.is_structured() {
        let report = ForecastReport::from(fleet);
        return write_output(&to_structured(&report, format == OutputFormat::Json)?, output);
    }

    let mut content = String::new();
    let human = matches!(format, OutputFormat::Table | OutputFormat::Md);

    if human && !global.quiet {
        content.push_str(&format!(
            "{} next {} days ({} h), {} policy\n",
            style("Replacement forecast:").bold(),
            fleet.horizon_days,
            fleet.horizon_hours,
            fleet.policy
        ));
    }

    content.push_str(&render_fleet(&fleet, format, currency));

    if human {
        content.push_str(&format!(
            "\n{} {}\n",
            style("Grand total:").bold(),
            style(format_cost(fleet.total_cost(), currency)).yellow().bold()
        ));
    }

    write_output(&content, output)
}

const FLEET_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("part_id", "PART"),
    ColumnDef::new("units", "UNITS"),
    ColumnDef::new("count", "EXP. COUNT"),
    ColumnDef::new("unit_cost_mean", "UNIT COST"),
    ColumnDef::new("unit_cost_std", "STD"),
    ColumnDef::new("total_cost", "EXP. COST"),
    ColumnDef::new("cost_low_95", "LOW 95%"),
    ColumnDef::new("cost_high_95", "HIGH 95%"),
];

/// One row per part type; cost bounds only when a deviation is known
pub fn render_fleet(fleet: &FleetForecast, format: OutputFormat, currency: &str) -> String {
    let rows: Vec<TableRow> = fleet
        .parts
        .iter()
        .map(|(part_id, f)| {
            let (low, high) = f.cost_interval(Z_95);
            let bound = |v: f64| {
                if f.unit_cost_std > 0.0 {
                    CellValue::Money(v)
                } else {
                    CellValue::Empty
                }
            };
            TableRow::new()
                .text(part_id.clone())
                .cell(CellValue::Number(f.unit_count as f64))
                .cell(CellValue::Float(f.expected_replacement_count, 2))
                .cell(CellValue::Money(f.unit_cost_mean))
                .cell(CellValue::Money(f.unit_cost_std))
                .cell(CellValue::Money(f.expected_total_cost))
                .cell(bound(low))
                .cell(bound(high))
        })
        .collect();

    TableFormatter::new(FLEET_COLUMNS)
        .with_currency(currency)
        .render(&rows, format)
}

fn render_comparison(comparison: &[HorizonComparison], format: OutputFormat, currency: &str) -> String {
    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("part_id", "PART"),
        ColumnDef::new("count_30d", "30 DAYS"),
        ColumnDef::new("count_60d", "60 DAYS"),
        ColumnDef::new("count_90d", "90 DAYS"),
        ColumnDef::new("count_180d", "180 DAYS"),
        ColumnDef::new("total_cost_180d", "COST 180 DAYS"),
    ];

    let rows: Vec<TableRow> = comparison
        .iter()
        .map(|c| {
            let mut row = TableRow::new().text(c.part_id.clone());
            for count in c.counts.values() {
                row = row.cell(CellValue::Float(*count, 2));
            }
            let longest = c.costs.values().last().copied().unwrap_or(0.0);
            row.cell(CellValue::Money(longest))
        })
        .collect();

    TableFormatter::new(COLUMNS)
        .with_currency(currency)
        .render(&rows, format)
}
