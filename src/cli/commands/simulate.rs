//! `pcf simulate` command - time-based vs predictive maintenance costs

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::cli::helpers::{format_cost, format_number, to_structured, write_output};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::entities::strategy::{StrategyComparison, StrategyInputs};

#[derive(clap::Args, Debug, Default)]
pub struct SimulateArgs {
    /// Load inputs from a YAML/JSON file (flags override file values)
    #[arg(long)]
    pub inputs: Option<PathBuf>,

    /// Simulated period in months
    #[arg(long)]
    pub months: Option<f64>,

    /// Units in service
    #[arg(long)]
    pub components: Option<f64>,

    /// Part cost per replacement
    #[arg(long)]
    pub part_cost: Option<f64>,

    /// Labor cost of a planned replacement
    #[arg(long)]
    pub planned_labor: Option<f64>,

    /// Labor cost of an emergency replacement
    #[arg(long)]
    pub unplanned_labor: Option<f64>,

    /// Downtime loss per hour
    #[arg(long)]
    pub downtime_cost: Option<f64>,

    /// Mean time to repair in hours
    #[arg(long)]
    pub mttr: Option<f64>,

    /// Weibull scale parameter in months
    #[arg(long)]
    pub eta_months: Option<f64>,

    /// B10 life in months
    #[arg(long)]
    pub b10_months: Option<f64>,

    /// Time-based replacement interval in months
    #[arg(long)]
    pub interval: Option<f64>,

    /// Probability of failure within one time-based interval (0-1)
    #[arg(long)]
    pub failure_prob: Option<f64>,
}

impl SimulateArgs {
    /// Overlay the flags that were given onto `base`
    pub fn apply(&self, mut base: StrategyInputs) -> StrategyInputs {
        let overrides = [
            (self.months, &mut base.simulation_months),
            (self.components, &mut base.num_components),
            (self.part_cost, &mut base.part_cost),
            (self.planned_labor, &mut base.planned_labor_cost),
            (self.unplanned_labor, &mut base.unplanned_labor_cost),
            (self.downtime_cost, &mut base.downtime_cost_per_hour),
            (self.mttr, &mut base.mttr_hours),
            (self.eta_months, &mut base.eta_months),
            (self.b10_months, &mut base.b10_life_months),
            (self.interval, &mut base.tbm_interval_months),
            (self.failure_prob, &mut base.tbm_failure_prob),
        ];
        for (value, field) in overrides {
            if let Some(v) = value {
                *field = v;
            }
        }
        base
    }
}

fn load_inputs(path: &Path) -> Result<StrategyInputs> {
    let content = std::fs::read_to_string(path).into_diagnostic()?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).into_diagnostic()
    } else {
        serde_yml::from_str(&content).into_diagnostic()
    }
}

pub fn run(args: SimulateArgs, global: &GlobalOpts) -> Result<()> {
    let base = match &args.inputs {
        Some(path) => load_inputs(path)?,
        None => StrategyInputs::default(),
    };
    let inputs = args.apply(base);
    let comparison = inputs.compare();
    tracing::debug!(savings = comparison.savings, "strategy comparison");

    let config = Config::load();
    let format = global.format.resolve(config.default_format.as_deref());

    if format.is_structured() {
        #[derive(serde::Serialize)]
        struct Output<'a> {
            inputs: &'a StrategyInputs,
            #[serde(flatten)]
            comparison: &'a StrategyComparison,
        }
        let out = Output {
            inputs: &inputs,
            comparison: &comparison,
        };
        return write_output(&to_structured(&out, format == OutputFormat::Json)?, None);
    }

    let currency = config.currency();
    let mut content = String::new();
    let human = matches!(format, OutputFormat::Table | OutputFormat::Md);

    if human && !global.quiet {
        content.push_str(&format!(
            "{} {} units over {} months (cost per failure {})\n",
            style("Maintenance strategy comparison:").bold(),
            format_number(inputs.num_components),
            format_number(inputs.simulation_months),
            format_cost(inputs.cost_per_failure(), currency)
        ));
    }

    content.push_str(&render_comparison(&comparison, format, currency));

    if human {
        let verdict = if comparison.savings >= 0.0 {
            style(format!(
                "Predictive maintenance saves {}",
                format_cost(comparison.savings, currency)
            ))
            .green()
            .bold()
        } else {
            style(format!(
                "Time-based maintenance is cheaper by {}",
                format_cost(-comparison.savings, currency)
            ))
            .yellow()
            .bold()
        };
        content.push_str(&format!("\n{}\n", verdict));
    }

    write_output(&content, None)
}

pub fn render_comparison(comparison: &StrategyComparison, format: OutputFormat, currency: &str) -> String {
    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("strategy", "STRATEGY"),
        ColumnDef::new("replacements", "REPLACEMENTS"),
        ColumnDef::new("planned_cost", "PLANNED"),
        ColumnDef::new("wasted_life_cost", "WASTED LIFE"),
        ColumnDef::new("failure_cost", "FAILURES"),
        ColumnDef::new("total_cost", "TOTAL"),
    ];

    let rows: Vec<TableRow> = [("tbm", &comparison.tbm), ("pdm", &comparison.pdm)]
        .into_iter()
        .map(|(name, cost)| {
            TableRow::new()
                .text(name)
                .cell(CellValue::Float(cost.total_replacements, 1))
                .cell(CellValue::Money(cost.planned_cost))
                .cell(CellValue::Money(cost.wasted_life_cost))
                .cell(CellValue::Money(cost.failure_cost))
                .cell(CellValue::Money(cost.total_cost))
        })
        .collect();

    TableFormatter::new(COLUMNS)
        .with_currency(currency)
        .render(&rows, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides_only_given_flags() {
        let args = SimulateArgs {
            components: Some(10.0),
            interval: Some(6.0),
            ..Default::default()
        };
        let inputs = args.apply(StrategyInputs::default());
        assert_eq!(inputs.num_components, 10.0);
        assert_eq!(inputs.tbm_interval_months, 6.0);
        assert_eq!(inputs.simulation_months, 60.0);
    }

    #[test]
    fn test_render_comparison_csv() {
        let comparison = StrategyInputs::default().compare();
        let csv = render_comparison(&comparison, OutputFormat::Csv, "");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("tbm,1500.0,"));
        assert!(lines[2].starts_with("pdm,375.0,"));
    }

    #[test]
    fn test_load_inputs_from_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("inputs.yaml");
        std::fs::write(&path, "num_components: 20\nmttr_hours: 8\n").unwrap();
        let inputs = load_inputs(&path).unwrap();
        assert_eq!(inputs.num_components, 20.0);
        assert_eq!(inputs.mttr_hours, 8.0);
        assert_eq!(inputs.part_cost, 500_000.0);
    }
}
