//! `pcf cdf` command - single-unit CDF and window failure probability

use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{self, format_percent, to_structured, write_output};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::weibull::{cdf, WindowPolicy};
use crate::core::Config;
use crate::entities::unit::{HorizonWindow, UnitObservation};

#[derive(clap::Args, Debug)]
pub struct CdfArgs {
    /// Current age of the unit in hours
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub age: f64,

    /// Weibull shape parameter
    #[arg(long, allow_negative_numbers = true)]
    pub beta: f64,

    /// Weibull scale parameter in hours
    #[arg(long, allow_negative_numbers = true)]
    pub eta: f64,

    /// Forecast horizon in days (default: config horizon_days)
    #[arg(long)]
    pub horizon_days: Option<u32>,
}

/// Everything `pcf cdf` reports for one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdfReport {
    pub age_hours: f64,
    pub beta: f64,
    pub eta: f64,
    pub horizon_days: u32,
    pub horizon_hours: f64,
    pub policy: WindowPolicy,
    /// F(age)
    pub cdf_at_age: f64,
    /// F(age + horizon)
    pub cdf_at_horizon_end: f64,
    /// R(age)
    pub reliability: f64,
    /// h(age), failures per hour
    pub hazard_rate: f64,
    pub window_probability: f64,
}

pub fn evaluate(unit: &UnitObservation, horizon: HorizonWindow, policy: WindowPolicy) -> CdfReport {
    let age = unit.age_hours.max(0.0);
    let cdf_at_age = cdf(age, unit.eta, unit.beta);

    CdfReport {
        age_hours: unit.age_hours,
        beta: unit.beta,
        eta: unit.eta,
        horizon_days: horizon.days(),
        horizon_hours: horizon.hours(),
        policy,
        cdf_at_age,
        cdf_at_horizon_end: cdf(age + horizon.hours(), unit.eta, unit.beta),
        reliability: 1.0 - cdf_at_age,
        hazard_rate: unit.params().map(|p| p.hazard_rate(age)).unwrap_or(0.0),
        window_probability: unit.failure_probability(horizon, policy),
    }
}

pub fn run(args: CdfArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let estimator = helpers::estimator(global, &config);
    let days = helpers::horizon_days(args.horizon_days, None, &config);
    let horizon = HorizonWindow::from_days(days);

    let unit = UnitObservation::new("", args.age, args.beta, args.eta);
    if unit.params().is_none() {
        tracing::warn!(beta = args.beta, eta = args.eta, "invalid Weibull parameters, probabilities are 0");
    }

    let report = evaluate(&unit, horizon, estimator.policy);
    let format = global.format.resolve(config.default_format.as_deref());

    if format.is_structured() {
        return write_output(&to_structured(&report, format == OutputFormat::Json)?, None);
    }

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("quantity", "QUANTITY"),
        ColumnDef::new("value", "VALUE"),
    ];

    let rows = vec![
        TableRow::new()
            .text(format!("F({})", report.age_hours))
            .cell(CellValue::Float(report.cdf_at_age, 6)),
        TableRow::new()
            .text(format!("F({} + {})", report.age_hours, report.horizon_hours))
            .cell(CellValue::Float(report.cdf_at_horizon_end, 6)),
        TableRow::new()
            .text("R(age)")
            .cell(CellValue::Float(report.reliability, 6)),
        TableRow::new()
            .text("h(age) per hour")
            .cell(CellValue::Float(report.hazard_rate, 8)),
        TableRow::new()
            .text(format!("P(fail in {} days)", report.horizon_days))
            .cell(CellValue::Float(report.window_probability, 6)),
    ];

    if format == OutputFormat::Table && !global.quiet {
        println!(
            "{} beta={} eta={} age={}h, {} policy",
            style("Weibull").bold(),
            report.beta,
            report.eta,
            report.age_hours,
            report.policy
        );
    }

    write_output(&TableFormatter::new(COLUMNS).render(&rows, format), None)?;

    if format == OutputFormat::Table && !global.quiet {
        println!(
            "Failure probability in the next {} days: {}",
            report.horizon_days,
            style(format_percent(report.window_probability)).yellow().bold()
        );
    }

    Ok(())
}
