//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::weibull::WindowPolicy;
use crate::core::Project;

/// Default forecast horizon in days
pub const DEFAULT_HORIZON_DAYS: u32 = 90;

/// Default number of ranked units shown per part
pub const DEFAULT_TOP_N: usize = 10;

/// Forecast configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Forecast horizon in days
    pub horizon_days: Option<u32>,

    /// Ranked rows shown per part
    pub top_n: Option<usize>,

    /// Minimum failure probability for ranked rows
    pub min_probability: Option<f64>,

    /// Window probability formula
    pub policy: Option<WindowPolicy>,

    /// Default output format
    pub default_format: Option<String>,

    /// Currency label for cost columns
    pub currency: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let project_path = Project::discover().ok().map(|p| p.config_path());
        let mut config = Self::load_from(Self::global_config_path().as_deref(), project_path.as_deref());
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Merge built-in defaults, then the global file, then the project file
    pub fn load_from(global: Option<&Path>, project: Option<&Path>) -> Self {
        let mut config = Config::default();

        for path in [global, project].into_iter().flatten() {
            if let Some(layer) = Self::read_file(path) {
                config.merge(layer);
            }
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read config file");
                return None;
            }
        };

        if contents.trim().is_empty() {
            return None;
        }

        match serde_yml::from_str::<Config>(&contents) {
            Ok(layer) => {
                tracing::debug!(path = %path.display(), "loaded config layer");
                Some(layer)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    /// Apply `PCF_*` environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(days) = lookup("PCF_HORIZON_DAYS") {
            match days.trim().parse::<u32>() {
                Ok(d) if d > 0 => self.horizon_days = Some(d),
                _ => tracing::warn!(value = %days, "ignoring invalid PCF_HORIZON_DAYS"),
            }
        }
        if let Some(policy) = lookup("PCF_POLICY") {
            match policy.parse::<WindowPolicy>() {
                Ok(p) => self.policy = Some(p),
                Err(e) => tracing::warn!(error = %e, "ignoring invalid PCF_POLICY"),
            }
        }
        if let Some(format) = lookup("PCF_FORMAT") {
            self.default_format = Some(format);
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "pcf").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.horizon_days.is_some() {
            self.horizon_days = other.horizon_days;
        }
        if other.top_n.is_some() {
            self.top_n = other.top_n;
        }
        if other.min_probability.is_some() {
            self.min_probability = other.min_probability;
        }
        if other.policy.is_some() {
            self.policy = other.policy;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.currency.is_some() {
            self.currency = other.currency;
        }
    }

    /// Effective horizon in days (never zero)
    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
            .filter(|&d| d > 0)
            .unwrap_or(DEFAULT_HORIZON_DAYS)
    }

    /// Effective ranked row cap
    pub fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    /// Effective window policy
    pub fn policy(&self) -> WindowPolicy {
        self.policy.unwrap_or_default()
    }

    /// Currency label, empty when unset
    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or("")
    }
}
