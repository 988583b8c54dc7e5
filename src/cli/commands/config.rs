//! `pcf config` command - Configuration management
//!
//! Provides commands to view and modify forecast configuration.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::core::project::Project;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path(PathArgs),

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,

    /// Show only project-level config
    #[arg(long = "project-only")]
    pub project_only: bool,

    /// Show only global (user) config
    #[arg(long = "global-only")]
    pub global_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., horizon_days, policy)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Show only project config path
    #[arg(long = "project-only")]
    pub project_only: bool,

    /// Show only global config path
    #[arg(long = "global-only")]
    pub global_only: bool,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("horizon_days", "Forecast horizon in days (30, 60, 90, 180, ...)"),
    ("top_n", "Units shown per part by `pcf rank`"),
    ("min_probability", "Hide ranked units below this probability (0-1)"),
    ("policy", "Window formula: conditional | unconditional"),
    (
        "default_format",
        "Default output format (table, json, yaml, csv, tsv, md)",
    ),
    ("currency", "Currency label for costs in tables"),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path(args) => run_path(args),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs) -> Result<()> {
    let config = Config::load();

    if let Some(key) = &args.key {
        ensure_valid_key(key)?;
        if let Some(v) = get_config_value(&config, key) {
            println!("{}", v);
        } else {
            return Err(miette::miette!("Key '{}' is not set", key));
        }
        return Ok(());
    }

    if args.project_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --project-only and --global-only"
        ));
    }

    if args.project_only {
        show_config_file("Project config:", &get_project_config_path()?)?;
    } else if args.global_only {
        show_config_file("Global config:", &get_global_config_path()?)?;
    } else {
        println!("{}", style("Effective Configuration").bold().underlined());
        println!();

        for (key, _) in VALID_KEYS {
            print_config_value(key, get_config_value(&config, key).as_deref());
        }

        println!();
        println!("{}", style("Config Sources (in priority order):").dim());
        println!("  1. Environment variables (PCF_HORIZON_DAYS, PCF_POLICY, PCF_FORMAT)");
        println!("  2. Project config (.pcf/config.yaml)");
        println!("  3. Global config (~/.config/pcf/config.yaml)");
    }

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    ensure_valid_key(&args.key)?;

    let config_path = if args.global {
        get_global_config_path()?
    } else {
        get_project_config_path()?
    };

    let mut config_map = read_mapping(&config_path)?;

    let value = parse_value(&args.value);
    if let serde_yml::Value::Mapping(map) = &mut config_map {
        map.insert(serde_yml::Value::String(args.key.clone()), value);
    }

    // Reject values the loader would silently drop
    serde_yml::from_value::<Config>(config_map.clone()).map_err(|e| {
        miette::miette!("Invalid value '{}' for {}: {}", args.value, args.key, e)
    })?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope
    );

    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    let config_path = if args.global {
        get_global_config_path()?
    } else {
        get_project_config_path()?
    };

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;

    let removed = match &mut config_map {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(args.key.clone()))
            .is_some(),
        _ => false,
    };

    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "project" };
    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope
    );

    Ok(())
}

fn run_path(args: PathArgs) -> Result<()> {
    if args.project_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --project-only and --global-only"
        ));
    }

    if args.project_only {
        println!("{}", get_project_config_path()?.display());
    } else if args.global_only {
        println!("{}", get_global_config_path()?.display());
    } else {
        let global_path = get_global_config_path()?;

        println!("{}", style("Configuration file paths:").bold());
        println!();
        println!("  {} {}", style("Global:").cyan(), global_path.display());
        print_exists(global_path.exists(), 9);

        println!();
        match get_project_config_path() {
            Ok(path) => {
                println!("  {} {}", style("Project:").cyan(), path.display());
                print_exists(path.exists(), 10);
            }
            Err(_) => println!(
                "  {} {}",
                style("Project:").cyan(),
                style("(not in a forecast project)").dim()
            ),
        }
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'pcf config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

// Helper functions

fn get_global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn get_project_config_path() -> Result<PathBuf> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    Ok(project.config_path())
}

fn ensure_valid_key(key: &str) -> Result<()> {
    if VALID_KEYS.iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(miette::miette!(
            help = "Run `pcf config keys` to list valid keys",
            "Unknown configuration key '{}'",
            key
        ))
    }
}

/// Parse a CLI value as YAML so numbers stay numbers
fn parse_value(raw: &str) -> serde_yml::Value {
    match serde_yml::from_str::<serde_yml::Value>(raw) {
        Ok(v) if !v.is_null() && !v.is_mapping() && !v.is_sequence() => v,
        _ => serde_yml::Value::String(raw.to_string()),
    }
}

fn read_mapping(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }

    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value =
        serde_yml::from_str(&content).unwrap_or(serde_yml::Value::Mapping(Default::default()));

    // Empty or comment-only files parse as null
    if parsed.is_mapping() {
        Ok(parsed)
    } else {
        Ok(serde_yml::Value::Mapping(Default::default()))
    }
}

pub(crate) fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "horizon_days" => config.horizon_days.map(|v| v.to_string()),
        "top_n" => config.top_n.map(|v| v.to_string()),
        "min_probability" => config.min_probability.map(|v| v.to_string()),
        "policy" => config.policy.map(|v| v.to_string()),
        "default_format" => config.default_format.clone(),
        "currency" => config.currency.clone(),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

fn print_exists(exists: bool, indent: usize) {
    let label = if exists {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    };
    println!("{:indent$}{}", "", label, indent = indent);
}

fn show_config_file(title: &str, path: &Path) -> Result<()> {
    println!("{} {}", style(title).bold(), style(path.display()).dim());
    println!();

    if path.exists() {
        let content = fs::read_to_string(path).into_diagnostic()?;
        print!("{}", content);
    } else {
        println!("{}", style("(not created)").dim());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::weibull::WindowPolicy;

    #[test]
    fn test_parse_value_keeps_numbers() {
        assert_eq!(parse_value("90"), serde_yml::Value::from(90));
        assert_eq!(parse_value("0.05"), serde_yml::Value::from(0.05));
        assert_eq!(
            parse_value("conditional"),
            serde_yml::Value::String("conditional".to_string())
        );
        assert_eq!(parse_value(""), serde_yml::Value::String(String::new()));
    }

    #[test]
    fn test_get_config_value() {
        let config = Config {
            horizon_days: Some(30),
            policy: Some(WindowPolicy::Unconditional),
            ..Default::default()
        };
        assert_eq!(get_config_value(&config, "horizon_days").as_deref(), Some("30"));
        assert_eq!(get_config_value(&config, "policy").as_deref(), Some("unconditional"));
        assert_eq!(get_config_value(&config, "currency"), None);
    }

    #[test]
    fn test_every_key_is_readable() {
        let config = Config {
            horizon_days: Some(1),
            top_n: Some(1),
            min_probability: Some(0.1),
            policy: Some(WindowPolicy::Conditional),
            default_format: Some("json".into()),
            currency: Some("USD".into()),
        };
        for (key, _) in VALID_KEYS {
            assert!(get_config_value(&config, key).is_some(), "{key}");
        }
    }

    #[test]
    fn test_read_mapping_handles_comment_only_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "# nothing here\n").unwrap();
        assert!(read_mapping(&path).unwrap().is_mapping());
    }
}
