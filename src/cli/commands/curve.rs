//! `pcf curve` command - survival curve and B-life

use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{format_number, to_structured, write_output};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::weibull::{survival_curve, CurvePoint, WeibullParams, MAX_CURVE_POINTS};
use crate::core::Config;

/// Sampling step used when none is given, in hours
pub const DEFAULT_STEP_HOURS: f64 = 50.0;

/// Default curve length as a multiple of the scale parameter
const DEFAULT_SPAN_FACTOR: f64 = 1.5;

#[derive(clap::Args, Debug)]
pub struct CurveArgs {
    /// Weibull shape parameter
    #[arg(long)]
    pub beta: f64,

    /// Weibull scale parameter in hours
    #[arg(long)]
    pub eta: f64,

    /// Curve length in hours (default: 1.5 x eta)
    #[arg(long)]
    pub max_hours: Option<f64>,

    /// Sampling step in hours
    #[arg(long, default_value_t = DEFAULT_STEP_HOURS)]
    pub step: f64,
}

/// Curve output with the usual B-lives
#[derive(Debug, Clone, Serialize)]
pub struct CurveReport {
    pub beta: f64,
    pub eta: f64,
    pub b1_life: Option<f64>,
    pub b10_life: Option<f64>,
    pub b50_life: Option<f64>,
    pub points: Vec<CurvePoint>,
}

pub fn build_report(params: &WeibullParams, max_hours: f64, step: f64) -> CurveReport {
    CurveReport {
        beta: params.beta,
        eta: params.eta,
        b1_life: params.b_life(0.01),
        b10_life: params.b_life(0.10),
        b50_life: params.b_life(0.50),
        points: survival_curve(params, max_hours, step),
    }
}

pub fn run(args: CurveArgs, global: &GlobalOpts) -> Result<()> {
    let params = WeibullParams::new(args.beta, args.eta).ok_or_else(|| {
        miette::miette!(
            help = "Both parameters must be positive numbers",
            "Invalid Weibull parameters: beta={}, eta={}",
            args.beta,
            args.eta
        )
    })?;

    if !(args.step > 0.0) {
        return Err(miette::miette!("--step must be positive (got {})", args.step));
    }

    if !args.step.is_finite() {
        return Err(miette::miette!("--step must be finite (got {})", args.step));
    }

    let max_hours = args.max_hours.unwrap_or(params.eta * DEFAULT_SPAN_FACTOR);
    if !(max_hours > 0.0 && max_hours.is_finite()) {
        return Err(miette::miette!(
            help = "Pass --max-hours with a positive, finite number of hours",
            "Curve length must be positive and finite (got {})",
            max_hours
        ));
    }
    if max_hours / args.step > MAX_CURVE_POINTS as f64 {
        tracing::warn!(
            max_hours,
            step = args.step,
            max_points = MAX_CURVE_POINTS,
            "curve step widened to stay within the point limit"
        );
    }

    let report = build_report(&params, max_hours, args.step);
    tracing::debug!(points = report.points.len(), "sampled survival curve");

    let config = Config::load();
    let format = global.format.resolve(config.default_format.as_deref());

    if format.is_structured() {
        return write_output(&to_structured(&report, format == OutputFormat::Json)?, None);
    }

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("hours", "HOURS"),
        ColumnDef::new("survival", "R(t)"),
    ];

    let rows: Vec<TableRow> = report
        .points
        .iter()
        .map(|p| {
            TableRow::new()
                .cell(CellValue::Number(p.hours))
                .cell(CellValue::Float(p.survival, 4))
        })
        .collect();

    if format == OutputFormat::Table && !global.quiet {
        let life = |v: Option<f64>| v.map(|h| format!("{} h", format_number(h.round()))).unwrap_or_default();
        println!("{} beta={} eta={}", style("Weibull").bold(), report.beta, report.eta);
        println!("  B1  life: {}", style(life(report.b1_life)).cyan());
        println!("  B10 life: {}", style(life(report.b10_life)).cyan().bold());
        println!("  B50 life: {}", style(life(report.b50_life)).cyan());
        println!();
    }

    write_output(&TableFormatter::new(COLUMNS).render(&rows, format), None)
}
