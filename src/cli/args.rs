//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    cdf::CdfArgs, completions::CompletionsArgs, config::ConfigCommands, curve::CurveArgs,
    forecast::ForecastArgs, init::InitArgs, rank::RankArgs, simulate::SimulateArgs,
};
use crate::core::weibull::WindowPolicy;

#[derive(Parser)]
#[command(name = "pcf")]
#[command(author, version, about = "Parts Cycle Forecast")]
#[command(long_about = "Weibull-based failure probability ranking and replacement cost forecasting for serial-numbered parts in service.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Window probability formula (conditional | unconditional)
    #[arg(long, global = true)]
    pub policy: Option<WindowPolicy>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new forecast project
    Init(InitArgs),

    /// Weibull CDF and window failure probability for a single unit
    Cdf(CdfArgs),

    /// Rank units by failure probability within the horizon
    Rank(RankArgs),

    /// Expected replacement counts and costs per part type
    Forecast(ForecastArgs),

    /// Survival curve and B-life for a Weibull distribution
    Curve(CurveArgs),

    /// Compare time-based and predictive maintenance costs
    Simulate(SimulateArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Use the configured default, falling back to a table
    #[default]
    Auto,
    /// Human-readable table
    Table,
    /// JSON format (for programming)
    Json,
    /// YAML format (full fidelity)
    Yaml,
    /// CSV format (for spreadsheets)
    Csv,
    /// Tab-separated values (for piping)
    Tsv,
    /// Markdown tables
    Md,
}

impl OutputFormat {
    /// Resolve `Auto` against the configured default format
    pub fn resolve(self, configured: Option<&str>) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }

        match configured.map(|s| OutputFormat::from_str(s, true)) {
            Some(Ok(OutputFormat::Auto)) | None => OutputFormat::Table,
            Some(Ok(format)) => format,
            Some(Err(_)) => {
                tracing::warn!(value = configured.unwrap_or_default(), "unknown default_format, using table");
                OutputFormat::Table
            }
        }
    }

    /// Machine-readable formats that should not carry styling
    pub fn is_structured(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Yaml)
    }
}
